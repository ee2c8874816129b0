//! Opaque spans: fragments held out of generic text passes.
//!
//! A fragment that later passes must not touch (a rendered code block, a
//! diagram placeholder) is swapped for a short numeric token before those
//! passes run and swapped back afterwards. Restoration is an exact lookup by
//! token index, never a re-match against content.

/// Opening sentinel of a span token (private-use code point).
pub(crate) const TOKEN_OPEN: char = '\u{E000}';
/// Closing sentinel of a span token (private-use code point).
pub(crate) const TOKEN_CLOSE: char = '\u{E001}';

/// Registry of protected fragments.
///
/// Tokens are handed out in order; the n-th protected fragment is restored
/// from the n-th token.
///
/// # Example
///
/// ```
/// use mdview_markup::OpaqueSpans;
///
/// let mut spans = OpaqueSpans::new();
/// let token = spans.protect("<pre><code>a\n\nb</code></pre>");
/// let text = format!("before\n{token}\nafter");
/// assert_eq!(spans.restore(&text), "before\n<pre><code>a\n\nb</code></pre>\nafter");
/// ```
#[derive(Debug, Default)]
pub struct OpaqueSpans {
    fragments: Vec<String>,
}

impl OpaqueSpans {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of protected fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether no fragment has been protected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Register `fragment` and return the token standing in for it.
    pub fn protect(&mut self, fragment: impl Into<String>) -> String {
        let index = self.fragments.len();
        self.fragments.push(fragment.into());
        token(index)
    }

    /// Replace every token in `text` with its original fragment.
    ///
    /// Malformed or unknown tokens are left as they are.
    #[must_use]
    pub fn restore(&self, text: &str) -> String {
        if self.fragments.is_empty() {
            return text.to_owned();
        }

        let mut result = String::with_capacity(text.len());
        let mut remaining = text;

        while let Some(start) = remaining.find(TOKEN_OPEN) {
            result.push_str(&remaining[..start]);
            let after_open = &remaining[start + TOKEN_OPEN.len_utf8()..];

            let fragment = after_open.find(TOKEN_CLOSE).and_then(|end| {
                let index = after_open[..end].parse::<usize>().ok()?;
                let fragment = self.fragments.get(index)?;
                Some((fragment, end))
            });

            if let Some((fragment, end)) = fragment {
                result.push_str(fragment);
                remaining = &after_open[end + TOKEN_CLOSE.len_utf8()..];
            } else {
                result.push(TOKEN_OPEN);
                remaining = after_open;
            }
        }

        result.push_str(remaining);
        result
    }
}

/// Check whether `line` consists of exactly one token.
pub(crate) fn is_token(line: &str) -> bool {
    line.strip_prefix(TOKEN_OPEN)
        .and_then(|rest| rest.strip_suffix(TOKEN_CLOSE))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn token(index: usize) -> String {
    format!("{TOKEN_OPEN}{index}{TOKEN_CLOSE}")
}
