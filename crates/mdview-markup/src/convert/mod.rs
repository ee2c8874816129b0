//! Block and inline markdown conversion.
//!
//! Passes run in a fixed order; each one sees the output of the previous:
//! code blocks, escaping, tables, lists, headings, bold, italic, inline
//! code, horizontal rules. Rendered code blocks are held out as opaque spans
//! so no later pass rewrites their contents. Diagram placeholders arrive as
//! span tokens from extraction and are never matched by any pass.
//!
//! Inline code runs after emphasis, so delimiters inside backticks are
//! already converted by the time the code span is formed.

mod block;
mod code;
mod inline;
mod list;
mod table;

use crate::escape::escape_html;
use crate::protect::{OpaqueSpans, is_token};

/// Convert extracted markdown text into block and inline HTML.
///
/// Span token lines are the only lines that bypass HTML escaping.
pub(crate) fn convert(text: &str, spans: &mut OpaqueSpans) -> String {
    let text = code::convert_code_blocks(text, spans);
    let text = escape_lines(&text);
    let text = table::convert_tables(&text);
    let text = list::convert_lists(&text);
    let text = block::convert_headings(&text);
    let text = inline::convert_bold(&text);
    let text = inline::convert_italic(&text);
    let text = inline::convert_inline_code(&text);
    block::convert_rules(&text)
}

/// Escape every line except span tokens.
fn escape_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if is_token(line) {
                line.to_owned()
            } else {
                escape_html(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(text: &str) -> String {
        let mut spans = OpaqueSpans::new();
        let converted = convert(text, &mut spans);
        spans.restore(&converted)
    }

    #[test]
    fn test_user_html_is_escaped() {
        assert_eq!(
            run("<img src=x onerror=alert(1)>"),
            "&lt;img src=x onerror=alert(1)&gt;"
        );
    }

    #[test]
    fn test_forged_placeholder_is_escaped() {
        let forged = r#"<div class="diagram-placeholder" id="diagram-9" data-source="eA=="></div>"#;
        let mut spans = OpaqueSpans::new();
        let out = convert(forged, &mut spans);
        assert!(out.starts_with("&lt;div"));
        assert!(spans.is_empty());
    }

    #[test]
    fn test_protected_placeholder_untouched() {
        let placeholder =
            r#"<div class="diagram-placeholder" id="diagram-0" data-source="Z3JhcGggVEQ="></div>"#;
        let mut spans = OpaqueSpans::new();
        let token = spans.protect(placeholder);
        let text = format!("# Title\n{token}\n**bold**");

        let out = convert(&text, &mut spans);

        assert_eq!(
            spans.restore(&out),
            format!("<h1>Title</h1>\n{placeholder}\n<strong>bold</strong>")
        );
    }

    #[test]
    fn test_emphasis_runs_before_inline_code() {
        assert_eq!(run("`__init__`"), "<code><strong>init</strong></code>");
        assert_eq!(run("`a*b`"), "<code>a*b</code>");
    }

    #[test]
    fn test_code_block_contents_untouched_by_inline_passes() {
        let out = run("```\n**not bold** | a |\n# not heading\n```");
        assert_eq!(
            out,
            "<pre><code>**not bold** | a |\n# not heading</code></pre>"
        );
    }

    #[test]
    fn test_pass_order_bold_before_italic() {
        assert_eq!(
            run("**strong** and *em*"),
            "<strong>strong</strong> and <em>em</em>"
        );
    }

    #[test]
    fn test_table_cells_get_inline_formatting() {
        let out = run("| **h** |\n|---|\n| `c` |");
        assert_eq!(
            out,
            "<table><thead><tr><th><strong>h</strong></th></tr></thead><tbody><tr><td><code>c</code></td></tr></tbody></table>"
        );
    }
}
