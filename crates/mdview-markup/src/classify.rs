//! Heuristic recognition of Mermaid diagram source.
//!
//! A line is a diagram start when it begins with one of a fixed set of
//! diagram-type keywords (case-insensitive). Directive lines (`%%{init: …}%%`
//! or `%%` comments) never start a diagram themselves but may precede one.

/// Prefix of Mermaid directive and comment lines.
pub const DIRECTIVE_PREFIX: &str = "%%";

/// Keywords that require a direction (`graph TD`, `flowchart LR`).
const FLOW_KEYWORDS: &[&str] = &["graph", "flowchart"];

/// Flow directions accepted after a flow keyword.
const FLOW_DIRECTIONS: &[&str] = &["td", "tb", "bt", "rl", "lr"];

/// Keywords that may be followed by anything (or nothing).
const DIAGRAM_KEYWORDS: &[&str] = &[
    "sequencediagram",
    "classdiagram-v2",
    "classdiagram",
    "statediagram-v2",
    "statediagram",
    "erdiagram",
    "gitgraph",
    "quadrantchart",
    "requirementdiagram",
    "c4context",
    "c4container",
    "c4component",
    "c4dynamic",
    "c4deployment",
    "sankey-beta",
    "xychart-beta",
    "block-beta",
];

/// Keywords that are also ordinary English words.
///
/// These only start a diagram when they stand alone on the line or are
/// followed by one of [`PROSE_KEYWORD_SUFFIXES`].
const PROSE_KEYWORDS: &[&str] = &["journey", "gantt", "pie", "mindmap", "timeline"];

const PROSE_KEYWORD_SUFFIXES: &[&str] = &["title", "showdata"];

/// Check whether `line` is a Mermaid directive or comment line.
#[must_use]
pub fn is_directive(line: &str) -> bool {
    line.trim_start().starts_with(DIRECTIVE_PREFIX)
}

/// Check whether `line` starts a diagram.
///
/// # Examples
///
/// ```
/// use mdview_markup::classify::is_diagram_start;
///
/// assert!(is_diagram_start("graph TD"));
/// assert!(is_diagram_start("  SequenceDiagram"));
/// assert!(is_diagram_start("pie title Pets"));
/// assert!(!is_diagram_start("graph theory is fun"));
/// assert!(!is_diagram_start("pie is delicious"));
/// ```
#[must_use]
pub fn is_diagram_start(line: &str) -> bool {
    let lowered = line.trim().to_ascii_lowercase();
    let mut words = lowered.split_whitespace();
    let Some(first) = words.next() else {
        return false;
    };
    let first = first.trim_end_matches(';');

    if FLOW_KEYWORDS.contains(&first) {
        return words
            .next()
            .map(|dir| dir.trim_end_matches(';'))
            .is_some_and(|dir| FLOW_DIRECTIONS.contains(&dir));
    }

    if DIAGRAM_KEYWORDS.contains(&first) {
        return true;
    }

    if PROSE_KEYWORDS.contains(&first) {
        return match words.next() {
            None => true,
            Some(next) => PROSE_KEYWORD_SUFFIXES.contains(&next),
        };
    }

    false
}

/// Return the first line that is neither blank nor a directive.
#[must_use]
pub fn first_content_line(source: &str) -> Option<&str> {
    source
        .lines()
        .find(|line| !line.trim().is_empty() && !is_directive(line))
}

/// Check whether a block of text looks like diagram source.
///
/// Only the first non-blank, non-directive line is tested.
#[must_use]
pub fn looks_like_diagram(source: &str) -> bool {
    first_content_line(source).is_some_and(is_diagram_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_keywords_need_direction() {
        assert!(is_diagram_start("graph LR"));
        assert!(is_diagram_start("graph TD;"));
        assert!(is_diagram_start("flowchart TB"));
        assert!(is_diagram_start("FLOWCHART bt"));
        assert!(!is_diagram_start("graph"));
        assert!(!is_diagram_start("flowchart of the process"));
    }

    #[test]
    fn test_diagram_keywords() {
        for line in [
            "sequenceDiagram",
            "classDiagram",
            "stateDiagram-v2",
            "stateDiagram",
            "erDiagram",
            "gitGraph",
            "quadrantChart",
            "requirementDiagram",
            "C4Context",
            "sankey-beta",
        ] {
            assert!(is_diagram_start(line), "expected diagram start: {line}");
        }
    }

    #[test]
    fn test_prose_keywords() {
        assert!(is_diagram_start("gantt"));
        assert!(is_diagram_start("journey"));
        assert!(is_diagram_start("mindmap"));
        assert!(is_diagram_start("timeline"));
        assert!(is_diagram_start("pie showData"));
        assert!(is_diagram_start("Pie Title Pets adopted"));
        assert!(!is_diagram_start("timeline of the project"));
        assert!(!is_diagram_start("journey to the west"));
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        assert!(!is_diagram_start("sequenceDiagrams are neat"));
        assert!(!is_diagram_start("piece of cake"));
        assert!(!is_diagram_start("ganttchart"));
    }

    #[test]
    fn test_blank_and_prose_lines() {
        assert!(!is_diagram_start(""));
        assert!(!is_diagram_start("   "));
        assert!(!is_diagram_start("Just some text."));
    }

    #[test]
    fn test_directive_lines() {
        assert!(is_directive("%%{init: {'theme': 'dark'}}%%"));
        assert!(is_directive("  %% comment"));
        assert!(!is_directive("% not a directive"));
        assert!(!is_diagram_start("%%{init: {}}%%"));
    }

    #[test]
    fn test_first_content_line_skips_blank_and_directives() {
        let source = "\n%%{init: {}}%%\n\nsequenceDiagram\nA->>B: hi";
        assert_eq!(first_content_line(source), Some("sequenceDiagram"));
        assert!(looks_like_diagram(source));
    }

    #[test]
    fn test_looks_like_diagram_tests_first_line_only() {
        assert!(!looks_like_diagram("let x = 1;\ngraph TD"));
        assert!(!looks_like_diagram(""));
        assert!(!looks_like_diagram("%% only a directive"));
    }
}
