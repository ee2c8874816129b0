//! Removal of non-content wrapper tags.
//!
//! Text fed to the viewer frequently carries reasoning or debug wrappers
//! (`<think>…</think>`) emitted by upstream tooling. They are removed together
//! with everything they enclose before any markdown interpretation happens.

use regex::Regex;

use crate::protect::{TOKEN_CLOSE, TOKEN_OPEN};

/// Wrapper tags stripped by default.
pub const DEFAULT_STRIP_TAGS: &[&str] = &["think", "thinking", "reasoning", "scratchpad", "debug"];

/// Strips known wrapper tags and normalizes input text.
///
/// # Example
///
/// ```
/// use mdview_markup::Sanitizer;
///
/// let sanitizer = Sanitizer::new();
/// let clean = sanitizer.strip("<think>plan the answer</think>\n\n# Answer");
/// assert_eq!(clean, "# Answer");
/// ```
#[derive(Debug, Clone)]
pub struct Sanitizer {
    /// One pattern per tag: a closed block or an unclosed opener to end of input.
    patterns: Vec<Regex>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer {
    /// Create a sanitizer for [`DEFAULT_STRIP_TAGS`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_tags(DEFAULT_STRIP_TAGS.iter().copied())
    }

    /// Create a sanitizer for the default tags plus `extra`.
    ///
    /// Tag names outside `[A-Za-z0-9_-]` are ignored.
    #[must_use]
    pub fn with_extra_tags<'a>(extra: impl IntoIterator<Item = &'a str>) -> Self {
        Self::with_tags(DEFAULT_STRIP_TAGS.iter().copied().chain(extra))
    }

    /// Create a sanitizer for exactly the given tags.
    #[must_use]
    pub fn with_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut patterns = Vec::new();
        for tag in tags {
            if tag.is_empty()
                || !tag
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                tracing::warn!(tag, "ignoring invalid strip tag name");
                continue;
            }
            let name = regex::escape(tag);
            let pattern = format!(r"(?is)<{name}(?:\s[^>]*)?>(?:.*?</{name}\s*>|.*\z)");
            match Regex::new(&pattern) {
                Ok(re) => patterns.push(re),
                Err(e) => tracing::warn!(tag, error = %e, "failed to compile strip tag pattern"),
            }
        }
        Self { patterns }
    }

    /// Remove wrapper tags and their contents, then normalize the result.
    ///
    /// Normalization converts `\r\n` to `\n`, drops the private-use characters
    /// reserved for opaque-span tokens, and trims leading blank lines.
    #[must_use]
    pub fn strip(&self, text: &str) -> String {
        let mut current = text.to_owned();
        for re in &self.patterns {
            if re.is_match(&current) {
                current = re.replace_all(&current, "").into_owned();
            }
        }

        let normalized: String = current
            .replace("\r\n", "\n")
            .chars()
            .filter(|&c| c != TOKEN_OPEN && c != TOKEN_CLOSE)
            .collect();

        trim_leading_blank_lines(&normalized).to_owned()
    }
}

/// Strip wrapper tags with the default [`Sanitizer`].
#[must_use]
pub fn strip_artifacts(text: &str) -> String {
    Sanitizer::new().strip(text)
}

/// Return `text` starting at its first line that has non-whitespace content.
fn trim_leading_blank_lines(text: &str) -> &str {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            return &text[offset..];
        }
        offset += line.len();
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_think_block() {
        let input = "<think>\nsecret plan\n</think>\nVisible";
        assert_eq!(strip_artifacts(input), "Visible");
    }

    #[test]
    fn test_strip_is_case_insensitive_with_attributes() {
        let input = "Before <THINKING mode=\"fast\">hidden</Thinking> after";
        assert_eq!(strip_artifacts(input), "Before  after");
    }

    #[test]
    fn test_strip_does_not_confuse_similar_tag_names() {
        // <think> pattern must not eat a <thinking> block's closing tag
        let input = "<thinking>a</thinking>keep<think>b</think>";
        assert_eq!(strip_artifacts(input), "keep");
    }

    #[test]
    fn test_unclosed_tag_strips_to_end() {
        let input = "Answer first\n<reasoning>never closed\nmore";
        assert_eq!(strip_artifacts(input), "Answer first\n");
    }

    #[test]
    fn test_multiple_blocks_removed() {
        let input = "<debug>1</debug>a<debug>2</debug>b";
        assert_eq!(strip_artifacts(input), "ab");
    }

    #[test]
    fn test_absent_tag_is_noop() {
        assert_eq!(strip_artifacts("plain *text*"), "plain *text*");
    }

    #[test]
    fn test_leading_blank_lines_trimmed() {
        assert_eq!(strip_artifacts("\n   \n\t\n# Title\n"), "# Title\n");
    }

    #[test]
    fn test_only_blank_lines_yields_empty() {
        assert_eq!(strip_artifacts("\n\n  \n"), "");
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(strip_artifacts("a\r\nb\r\n"), "a\nb\n");
    }

    #[test]
    fn test_token_sentinels_removed() {
        let input = format!("x{TOKEN_OPEN}0{TOKEN_CLOSE}y");
        assert_eq!(strip_artifacts(&input), "x0y");
    }

    #[test]
    fn test_extra_tags() {
        let sanitizer = Sanitizer::with_extra_tags(["internal"]);
        assert_eq!(sanitizer.strip("<internal>x</internal>ok<think>y</think>"), "ok");
    }

    #[test]
    fn test_invalid_tag_names_ignored() {
        let sanitizer = Sanitizer::with_tags(["", "a b", "x>y"]);
        assert_eq!(sanitizer.strip("<a b>keep</a b>"), "<a b>keep</a b>");
    }
}
