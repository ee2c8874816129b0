//! Inline emphasis and code spans.
//!
//! The `regex` crate has no lookaround, so the delimiter-adjacency rules
//! (no `*` directly outside an italic span, no intraword `_`) are checked
//! against the haystack around each match instead.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BOLD_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^\s*](?:[^\n]*?[^\s*])?)\*\*").unwrap());
static BOLD_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^\s_](?:[^\n]*?[^\s_])?)__").unwrap());
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^\s*](?:[^*\n]*[^\s*])?)\*").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^\s_](?:[^_\n]*[^\s_])?)_").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

/// Convert `**x**` and `__x__` into `<strong>`.
pub(super) fn convert_bold(text: &str) -> String {
    let out = replace_delimited(&BOLD_STAR, text, '*', false, "strong");
    replace_delimited(&BOLD_UNDERSCORE, &out, '_', true, "strong")
}

/// Convert `*x*` and `_x_` into `<em>`.
///
/// Must run after [`convert_bold`] so a single delimiter never fires inside
/// a double-delimiter span.
pub(super) fn convert_italic(text: &str) -> String {
    let out = replace_delimited(&ITALIC_STAR, text, '*', false, "em");
    replace_delimited(&ITALIC_UNDERSCORE, &out, '_', true, "em")
}

/// Convert `` `x` `` into `<code>`.
pub(super) fn convert_inline_code(text: &str) -> String {
    INLINE_CODE.replace_all(text, "<code>$1</code>").into_owned()
}

/// Wrap matches of `re` in `tag`, skipping matches touching another
/// `delimiter` (and, for `_`, matches inside a word).
fn replace_delimited(
    re: &Regex,
    text: &str,
    delimiter: char,
    word_bound: bool,
    tag: &str,
) -> String {
    re.replace_all(text, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let Some(m) = caps.get(0) else {
            return whole.to_owned();
        };
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();

        let touches_delimiter = before == Some(delimiter) || after == Some(delimiter);
        let intraword = word_bound
            && (before.is_some_and(char::is_alphanumeric)
                || after.is_some_and(char::is_alphanumeric));

        if touches_delimiter || intraword {
            whole.to_owned()
        } else {
            format!("<{tag}>{}</{tag}>", &caps[1])
        }
    })
    .into_owned()
}
