//! Line-numbered raw display.

use std::fmt::Write as _;

use crate::escape::escape_html;

/// Render `text` verbatim as numbered lines, bypassing the markdown pipeline.
///
/// Produces a `<pre class="lines">` with one `<span class="line">` per input
/// line. Line numbers start at 1 and content is HTML-escaped.
///
/// # Example
///
/// ```
/// use mdview_markup::render_lines;
///
/// assert_eq!(
///     render_lines("a\n<b>"),
///     "<pre class=\"lines\">\
///      <span class=\"line\" data-line=\"1\"><span class=\"line-number\">1</span>a</span>\n\
///      <span class=\"line\" data-line=\"2\"><span class=\"line-number\">2</span>&lt;b&gt;</span>\
///      </pre>"
/// );
/// ```
#[must_use]
pub fn render_lines(text: &str) -> String {
    let mut html = String::from("<pre class=\"lines\">");
    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            html.push('\n');
        }
        let number = idx + 1;
        let _ = write!(
            html,
            r#"<span class="line" data-line="{number}"><span class="line-number">{number}</span>{}</span>"#,
            escape_html(line)
        );
    }
    html.push_str("</pre>");
    html
}
