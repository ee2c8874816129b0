//! Paragraph wrapping.

use crate::protect::is_token;

/// Block-level tag openers that are never wrapped in a paragraph.
const BLOCK_PREFIXES: &[&str] = &[
    "<h1", "<h2", "<h3", "<h4", "<h5", "<h6", "<hr", "<table", "<ul", "<ol", "<pre", "<div",
    "<blockquote",
];

/// Wrap bare text lines into `<p>` elements.
///
/// A blank line or a block-start line closes the open paragraph. Consecutive
/// text lines are trimmed and joined with `<br>` inside one paragraph. Block
/// lines and lone span tokens pass through untouched; blank lines are dropped.
pub(crate) fn wrap_paragraphs(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut open: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            close(&mut out, &mut open);
        } else if is_block_start(trimmed) {
            close(&mut out, &mut open);
            out.push(line.to_owned());
        } else {
            open.push(trimmed);
        }
    }
    close(&mut out, &mut open);

    out.join("\n")
}

fn is_block_start(trimmed: &str) -> bool {
    is_token(trimmed) || BLOCK_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

fn close(out: &mut Vec<String>, open: &mut Vec<&str>) {
    if open.is_empty() {
        return;
    }
    out.push(format!("<p>{}</p>", open.join("<br>")));
    open.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::OpaqueSpans;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_line_separates_paragraphs() {
        assert_eq!(wrap_paragraphs("one\n\ntwo"), "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn test_consecutive_lines_joined_with_break() {
        assert_eq!(wrap_paragraphs("  a  \nb"), "<p>a<br>b</p>");
    }

    #[test]
    fn test_block_lines_close_paragraph() {
        assert_eq!(
            wrap_paragraphs("text\n<h2>T</h2>\nmore\n<hr>"),
            "<p>text</p>\n<h2>T</h2>\n<p>more</p>\n<hr>"
        );
    }

    #[test]
    fn test_inline_markup_line_is_text() {
        assert_eq!(
            wrap_paragraphs("<strong>a</strong> b"),
            "<p><strong>a</strong> b</p>"
        );
    }

    #[test]
    fn test_tokens_are_never_wrapped() {
        let mut spans = OpaqueSpans::new();
        let token = spans.protect("<x>\n\n</x>");
        let text = format!("before\n{token}\nafter");
        assert_eq!(
            wrap_paragraphs(&text),
            format!("<p>before</p>\n{token}\n<p>after</p>")
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(wrap_paragraphs(""), "");
        assert_eq!(wrap_paragraphs("\n\n"), "");
    }
}
