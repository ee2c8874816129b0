//! Committed document state.
//!
//! A [`Document`] is the HTML of one pipeline run together with one slot per
//! diagram placeholder in it. Slots are filled in place, one at a time, as
//! renders complete; sibling slots are never touched.
//!
//! Each slot records the byte range its fragment occupies. Replacements are
//! applied by range and shift the ranges of later slots, so text elsewhere in
//! the document that happens to equal a fragment is never rewritten.

use std::ops::Range;

use mdview_markup::{RenderedMarkup, escape_html};

use crate::error::DiagramError;

/// Render state of a single diagram placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// In the committed HTML, not yet dispatched.
    Pending,
    /// Dispatched to the engine; the result has not been applied.
    Rendering,
    /// Replaced by engine output.
    Rendered,
    /// Replaced by the escaped source and an error note.
    Failed,
}

/// One diagram placeholder of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSlot {
    /// Placeholder id (`diagram-N`).
    pub id: String,
    /// Raw diagram source.
    pub source: String,
    /// Current render state.
    pub state: SlotState,
    /// Byte range of this slot's fragment in the document HTML.
    span: Option<Range<usize>>,
}

/// HTML of one pipeline run plus its diagram slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    generation: u64,
    html: String,
    slots: Vec<DiagramSlot>,
}

impl Document {
    /// An empty document at generation 0.
    pub(crate) fn empty() -> Self {
        Self {
            generation: 0,
            html: String::new(),
            slots: Vec::new(),
        }
    }

    /// Build a document from pipeline output; every slot starts `Pending`.
    ///
    /// Placeholders appear in the HTML in diagram order, so each one is
    /// searched for after the end of the previous one.
    pub(crate) fn new(generation: u64, markup: RenderedMarkup) -> Self {
        let mut cursor = 0;
        let slots = markup
            .diagrams
            .into_iter()
            .map(|block| {
                let placeholder = block.placeholder();
                let span = markup.html[cursor..].find(&placeholder).map(|offset| {
                    let start = cursor + offset;
                    cursor = start + placeholder.len();
                    start..cursor
                });
                if span.is_none() {
                    tracing::warn!(id = %block.id, "Diagram placeholder missing from document");
                }
                DiagramSlot {
                    id: block.id,
                    source: block.source,
                    state: SlotState::Pending,
                    span,
                }
            })
            .collect();
        Self {
            generation,
            html: markup.html,
            slots,
        }
    }

    /// Generation this document was committed under.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current HTML.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Diagram slots in document order.
    #[must_use]
    pub fn slots(&self) -> &[DiagramSlot] {
        &self.slots
    }

    /// Index of the first `Pending` slot.
    pub(crate) fn next_pending(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.state == SlotState::Pending)
    }

    pub(crate) fn slot(&self, index: usize) -> &DiagramSlot {
        &self.slots[index]
    }

    pub(crate) fn mark_rendering(&mut self, index: usize) {
        self.slots[index].state = SlotState::Rendering;
    }

    /// Return a `Rendering` slot to `Pending` so a later pass retries it.
    pub(crate) fn reset_rendering(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if slot.state == SlotState::Rendering {
            slot.state = SlotState::Pending;
        }
    }

    /// Replace the slot's fragment with rendered markup.
    pub(crate) fn apply_rendered(&mut self, index: usize, markup: &str) {
        let id = escape_html(&self.slots[index].id);
        let fragment = format!(r#"<figure class="diagram" id="{id}">{markup}</figure>"#);
        self.replace_fragment(index, &fragment);
        self.slots[index].state = SlotState::Rendered;
    }

    /// Replace the slot's fragment with its escaped source and an error note.
    pub(crate) fn apply_failed(&mut self, index: usize, error: &DiagramError) {
        let slot = &self.slots[index];
        let fragment = format!(
            r#"<figure class="diagram diagram-error" id="{}"><pre>{}</pre><figcaption>Diagram rendering failed: {}</figcaption></figure>"#,
            escape_html(&slot.id),
            escape_html(&slot.source),
            escape_html(&error.to_string())
        );
        self.replace_fragment(index, &fragment);
        self.slots[index].state = SlotState::Failed;
    }

    fn replace_fragment(&mut self, index: usize, fragment: &str) {
        let slot = &self.slots[index];
        let Some(span) = slot.span.clone() else {
            tracing::warn!(id = %slot.id, "Diagram fragment missing from document");
            return;
        };

        self.html.replace_range(span.clone(), fragment);
        let end = span.start + fragment.len();
        self.slots[index].span = Some(span.start..end);

        for slot in &mut self.slots[index + 1..] {
            if let Some(later) = &mut slot.span {
                *later = later.start - span.end + end..later.end - span.end + end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdview_markup::render_markdown;
    use pretty_assertions::assert_eq;

    fn two_diagrams() -> Document {
        let markup = render_markdown(
            "# T\n\n```mermaid\ngraph TD\nA-->B\n```\n\ntext\n\n```mermaid\npie\n```",
        );
        Document::new(1, markup)
    }

    #[test]
    fn test_new_document_slots_pending() {
        let doc = two_diagrams();
        assert_eq!(doc.generation(), 1);
        assert_eq!(doc.slots().len(), 2);
        assert!(doc.slots().iter().all(|s| s.state == SlotState::Pending));
        assert_eq!(doc.next_pending(), Some(0));
    }

    #[test]
    fn test_apply_rendered_replaces_only_its_slot() {
        let mut doc = two_diagrams();
        let second_placeholder = doc.html()[doc.slot(1).span.clone().unwrap()].to_owned();
        assert!(second_placeholder.starts_with(r#"<div class="diagram-placeholder" id="diagram-1""#));

        doc.mark_rendering(0);
        assert_eq!(doc.next_pending(), Some(1));
        doc.apply_rendered(0, "<svg>one</svg>");

        assert!(
            doc.html()
                .contains(r#"<figure class="diagram" id="diagram-0"><svg>one</svg></figure>"#)
        );
        assert!(doc.html().contains(&second_placeholder));
        assert_eq!(doc.slot(0).state, SlotState::Rendered);
        assert_eq!(doc.slot(1).state, SlotState::Pending);
    }

    #[test]
    fn test_apply_failed_shows_escaped_source() {
        let mut doc = Document::new(1, render_markdown("```mermaid\nA-->B<x>\n```"));
        doc.apply_failed(0, &DiagramError::Http("HTTP 400: bad <input>".to_owned()));

        assert_eq!(
            doc.html(),
            r#"<figure class="diagram diagram-error" id="diagram-0"><pre>A--&gt;B&lt;x&gt;</pre><figcaption>Diagram rendering failed: HTTP error: HTTP 400: bad &lt;input&gt;</figcaption></figure>"#
        );
        assert_eq!(doc.slot(0).state, SlotState::Failed);
        assert_eq!(doc.next_pending(), None);
    }

    #[test]
    fn test_lookalike_text_before_placeholder_is_not_replaced() {
        let markup = render_markdown("```mermaid\ngraph TD\n```");
        let placeholder = markup.diagrams[0].placeholder();
        // A copy of the placeholder ahead of the real one
        let html = format!("{placeholder}\n{}", markup.html);
        let mut doc = Document::new(
            1,
            RenderedMarkup {
                html,
                diagrams: markup.diagrams,
            },
        );

        doc.apply_rendered(0, "<svg/>");

        assert_eq!(
            doc.html(),
            format!(r#"{placeholder}
<figure class="diagram" id="diagram-0"><svg/></figure>"#)
        );
    }

    #[test]
    fn test_replacements_shift_later_slots() {
        let mut doc = two_diagrams();
        doc.apply_failed(0, &DiagramError::Disabled);
        doc.apply_rendered(1, "<svg>two</svg>");
        doc.apply_rendered(0, "<svg>one</svg>");

        let html = doc.html();
        assert!(html.starts_with("<h1>T</h1>\n<figure class=\"diagram\" id=\"diagram-0\"><svg>one</svg></figure>"));
        assert!(html.ends_with("<figure class=\"diagram\" id=\"diagram-1\"><svg>two</svg></figure>"));
        assert!(!html.contains("diagram-error"));
    }

    #[test]
    fn test_reset_rendering_only_touches_rendering_slots() {
        let mut doc = two_diagrams();
        doc.mark_rendering(0);
        doc.reset_rendering(0);
        assert_eq!(doc.slot(0).state, SlotState::Pending);

        doc.apply_rendered(1, "<svg/>");
        doc.reset_rendering(1);
        assert_eq!(doc.slot(1).state, SlotState::Rendered);
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::empty();
        assert_eq!(doc.html(), "");
        assert_eq!(doc.next_pending(), None);
    }
}
