//! Headings and horizontal rules.

use std::sync::LazyLock;

use regex::Regex;

/// Heading patterns indexed by level - 1.
static HEADINGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    (1..=6)
        .map(|level| {
            Regex::new(&format!(r"(?m)^[ \t]*#{{{level}}}(?:[ \t]+(.*?))?[ \t]*$")).unwrap()
        })
        .collect()
});

static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,})[ \t]*$").unwrap());

/// Convert `#`-prefixed lines into `<h1>`–`<h6>`.
///
/// A hash run alone on its line is an empty heading.
///
/// Levels are applied from 6 down to 1 so a long hash run is never claimed
/// by a shorter-prefix rule.
pub(super) fn convert_headings(text: &str) -> String {
    let mut out = text.to_owned();
    for level in (1..=6).rev() {
        let re = &HEADINGS[level - 1];
        if re.is_match(&out) {
            out = re
                .replace_all(&out, format!("<h{level}>$1</h{level}>").as_str())
                .into_owned();
        }
    }
    out
}

/// Convert standalone lines of three or more `-` or `*` into `<hr>`.
pub(super) fn convert_rules(text: &str) -> String {
    RULE.replace_all(text, "<hr>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_heading_levels() {
        let input = "# a\n## b\n### c\n#### d\n##### e\n###### f";
        assert_eq!(
            convert_headings(input),
            "<h1>a</h1>\n<h2>b</h2>\n<h3>c</h3>\n<h4>d</h4>\n<h5>e</h5>\n<h6>f</h6>"
        );
    }

    #[test]
    fn test_seven_hashes_not_heading() {
        assert_eq!(convert_headings("####### x"), "####### x");
    }

    #[test]
    fn test_lone_hashes_are_empty_headings() {
        assert_eq!(convert_headings("#\ntext\n##  "), "<h1></h1>\ntext\n<h2></h2>");
    }

    #[test]
    fn test_hash_without_space_not_heading() {
        assert_eq!(convert_headings("#tag"), "#tag");
    }

    #[test]
    fn test_heading_does_not_consume_next_line() {
        assert_eq!(convert_headings("#  \nnext"), "<h1></h1>\nnext");
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        assert_eq!(convert_headings("## Title  "), "<h2>Title</h2>");
    }

    #[test]
    fn test_rules() {
        assert_eq!(convert_rules("---\n*****\n  ---  "), "<hr>\n<hr>\n<hr>");
    }

    #[test]
    fn test_rule_needs_three_and_standalone() {
        let input = "--\n--- text\n-*-";
        assert_eq!(convert_rules(input), input);
    }
}
