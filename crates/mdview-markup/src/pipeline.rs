//! The synchronous markdown pipeline.

use crate::convert::convert;
use crate::extract::{DiagramBlock, extract_protected};
use crate::paragraph::wrap_paragraphs;
use crate::protect::OpaqueSpans;
use crate::sanitize::Sanitizer;

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMarkup {
    /// Final HTML, one placeholder container per diagram.
    pub html: String,
    /// Diagrams extracted in this run, in document order.
    pub diagrams: Vec<DiagramBlock>,
}

/// Markdown to HTML pipeline.
///
/// Runs sanitize, extract, convert and paragraph wrapping in that order.
/// Every run is independent; ids restart at `diagram-0`.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    sanitizer: Sanitizer,
}

impl Pipeline {
    /// Create a pipeline with the default sanitizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with a custom sanitizer.
    #[must_use]
    pub fn with_sanitizer(sanitizer: Sanitizer) -> Self {
        Self { sanitizer }
    }

    /// Render `text` into HTML.
    ///
    /// Total over arbitrary input.
    #[must_use]
    pub fn render(&self, text: &str) -> RenderedMarkup {
        let clean = self.sanitizer.strip(text);

        // Placeholders are span tokens from here until the final restore
        let mut spans = OpaqueSpans::new();
        let extraction = extract_protected(&clean, &mut spans);
        tracing::trace!(diagrams = extraction.blocks.len(), "Extracted diagram blocks");

        let converted = convert(&extraction.text, &mut spans);
        let code_blocks = spans.len() - extraction.blocks.len();

        let wrapped = wrap_paragraphs(&converted);
        let html = spans.restore(&wrapped);

        tracing::debug!(
            input_bytes = text.len(),
            output_bytes = html.len(),
            diagrams = extraction.blocks.len(),
            code_blocks,
            "Rendered markdown"
        );

        RenderedMarkup {
            html,
            diagrams: extraction.blocks,
        }
    }
}

/// Render `text` with the default [`Pipeline`].
#[must_use]
pub fn render_markdown(text: &str) -> RenderedMarkup {
    Pipeline::new().render(text)
}
