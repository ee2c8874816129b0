//! Fenced code blocks.

use crate::escape::escape_html;
use crate::fence::fenced_block;
use crate::protect::OpaqueSpans;

/// Render closed fenced code blocks as `<pre><code>` and protect them.
///
/// Each rendered block is replaced by a span token on its own line.
/// Unterminated fences are left as text.
pub(super) fn convert_code_blocks(text: &str, spans: &mut OpaqueSpans) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut idx = 0;

    while idx < lines.len() {
        match fenced_block(&lines, idx) {
            Some(block) => {
                let body = lines[block.body.clone()].join("\n");
                let html = render_code_block(&block.fence.info, &body);
                out.push(spans.protect(html));
                idx = block.close + 1;
            }
            None => {
                out.push(lines[idx].to_owned());
                idx += 1;
            }
        }
    }

    out.join("\n")
}

fn render_code_block(lang: &str, body: &str) -> String {
    if lang.is_empty() {
        format!("<pre><code>{}</code></pre>", escape_html(body))
    } else {
        format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_html(lang),
            escape_html(body)
        )
    }
}
