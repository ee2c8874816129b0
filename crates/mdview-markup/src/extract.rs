//! Diagram block extraction.
//!
//! Locates Mermaid source in the text and replaces each block with a
//! single-line placeholder container before any markdown pass can touch it.
//!
//! Detection order, first match wins per region:
//! 1. Fences tagged with [`DIAGRAM_FENCE_LANGUAGE`] are always diagrams.
//! 2. Fences without a language are diagrams when their first content line
//!    is a diagram start (see [`crate::classify`]); otherwise they stay code.
//! 3. Unfenced regions starting with a diagram keyword, optionally preceded
//!    by a directive line, run until a terminator line.

use crate::classify::{is_diagram_start, is_directive, looks_like_diagram};
use crate::fence::{Fence, fenced_block};
use crate::payload;
use crate::protect::OpaqueSpans;

/// Fence language that unconditionally marks a diagram block.
pub const DIAGRAM_FENCE_LANGUAGE: &str = "mermaid";

/// CSS class of placeholder containers.
pub const PLACEHOLDER_CLASS: &str = "diagram-placeholder";

/// A diagram found in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Identifier unique within one extraction pass (`diagram-N`).
    pub id: String,
    /// Diagram source exactly as captured.
    pub source: String,
}

impl DiagramBlock {
    /// Placeholder container standing in for this block.
    ///
    /// Always a single line; the source travels base64-encoded.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!(
            r#"<div class="{PLACEHOLDER_CLASS}" id="{}" data-source="{}"></div>"#,
            self.id,
            payload::encode(&self.source)
        )
    }
}

/// Output of [`extract_diagrams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Input text with every diagram block replaced by its placeholder line.
    pub text: String,
    /// Extracted blocks in document order.
    pub blocks: Vec<DiagramBlock>,
}

/// Replace diagram blocks in `text` with placeholder containers.
///
/// # Example
///
/// ```
/// use mdview_markup::extract_diagrams;
///
/// let extraction = extract_diagrams("Intro\n\nsequenceDiagram\nA->>B: hi\n\nOutro");
/// assert_eq!(extraction.blocks.len(), 1);
/// assert_eq!(extraction.blocks[0].source, "sequenceDiagram\nA->>B: hi");
/// assert!(extraction.text.contains(r#"id="diagram-0""#));
/// assert!(extraction.text.ends_with("\n\nOutro"));
/// ```
#[must_use]
pub fn extract_diagrams(text: &str) -> Extraction {
    let mut extractor = Extractor::default();
    extractor.run(text);
    extractor.finish()
}

/// Like [`extract_diagrams`], but each block is replaced by a span token
/// registered in `spans` instead of a literal placeholder line.
///
/// Restoring the spans yields the placeholders at exactly the positions the
/// blocks were found, so input text that merely looks like a placeholder can
/// never stand in for one.
pub(crate) fn extract_protected(text: &str, spans: &mut OpaqueSpans) -> Extraction {
    let mut extractor = Extractor {
        spans: Some(spans),
        ..Extractor::default()
    };
    extractor.run(text);
    extractor.finish()
}

#[derive(Default)]
struct Extractor<'a> {
    out: Vec<String>,
    blocks: Vec<DiagramBlock>,
    spans: Option<&'a mut OpaqueSpans>,
}

impl Extractor<'_> {
    fn finish(self) -> Extraction {
        Extraction {
            text: self.out.join("\n"),
            blocks: self.blocks,
        }
    }

    fn run(&mut self, text: &str) {
        let lines: Vec<&str> = text.lines().collect();
        let mut idx = 0;

        while idx < lines.len() {
            let line = lines[idx];

            if Fence::open(line).is_some() {
                let Some(block) = fenced_block(&lines, idx) else {
                    // Unterminated fence runs to end of input
                    self.pass_through(&lines[idx..]);
                    break;
                };

                let body = lines[block.body.clone()].join("\n");
                let info = block.fence.info.as_str();
                let is_diagram = info.eq_ignore_ascii_case(DIAGRAM_FENCE_LANGUAGE)
                    || (info.is_empty() && looks_like_diagram(&body));

                if is_diagram {
                    self.push_diagram(body.trim());
                } else {
                    self.pass_through(&lines[idx..=block.close]);
                }
                idx = block.close + 1;
                continue;
            }

            let start = idx;
            let keyword_line = if is_directive(line)
                && lines.get(idx + 1).is_some_and(|next| is_diagram_start(next))
            {
                idx + 1
            } else if is_diagram_start(line) {
                idx
            } else {
                self.out.push(line.to_owned());
                idx += 1;
                continue;
            };

            let end = lines[keyword_line + 1..]
                .iter()
                .position(|l| is_terminator(l))
                .map_or(lines.len(), |offset| keyword_line + 1 + offset);

            self.push_diagram(lines[start..end].join("\n").trim_end());
            idx = end;
        }
    }

    fn pass_through(&mut self, lines: &[&str]) {
        self.out.extend(lines.iter().map(|&l| l.to_owned()));
    }

    fn push_diagram(&mut self, source: &str) {
        let block = DiagramBlock {
            id: format!("diagram-{}", self.blocks.len()),
            source: source.to_owned(),
        };
        let line = match self.spans.as_deref_mut() {
            Some(spans) => spans.protect(block.placeholder()),
            None => block.placeholder(),
        };
        self.out.push(line);
        self.blocks.push(block);
    }
}

/// Check whether `line` ends an unfenced diagram region.
///
/// Terminators are blank lines, fence openers, headings, list items, and
/// horizontal rules.
fn is_terminator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || Fence::open(line).is_some()
        || is_heading(trimmed)
        || is_list_item(trimmed)
        || is_horizontal_rule(trimmed)
}

fn is_heading(trimmed: &str) -> bool {
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes)
        && trimmed[hashes..]
            .chars()
            .next()
            .is_none_or(|c| c == ' ' || c == '\t')
}

fn is_list_item(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    if let Some('-' | '*' | '+') = chars.next() {
        return chars.next().is_some_and(char::is_whitespace);
    }

    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let mut rest = trimmed[digits..].chars();
    matches!(rest.next(), Some('.' | ')')) && rest.next().is_none_or(char::is_whitespace)
}

fn is_horizontal_rule(trimmed: &str) -> bool {
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_')
        && trimmed.chars().filter(|&c| c == first).count() >= 3
        && trimmed.chars().all(|c| c == first || c == ' ')
}
