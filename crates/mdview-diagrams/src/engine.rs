//! Diagram engine abstraction.

use std::future::Future;

use crate::error::DiagramError;

/// Markup produced by a diagram engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// Trusted markup (usually inline SVG) inserted into the document as-is.
    pub markup: String,
}

impl RenderedDiagram {
    /// Wrap engine output.
    #[must_use]
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }
}

/// An external, possibly slow, diagram renderer.
///
/// Calls cannot be cancelled. A session awaiting a render whose input has
/// since been replaced simply drops the result.
pub trait DiagramEngine: Send + Sync + 'static {
    /// Render the diagram identified by `id` from its raw `source`.
    fn render(
        &self,
        id: &str,
        source: &str,
    ) -> impl Future<Output = Result<RenderedDiagram, DiagramError>> + Send;
}

/// Engine used when diagram rendering is turned off.
///
/// Every render fails with [`DiagramError::Disabled`], so each diagram is
/// shown as its escaped source.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledEngine;

impl DiagramEngine for DisabledEngine {
    async fn render(&self, _id: &str, _source: &str) -> Result<RenderedDiagram, DiagramError> {
        Err(DiagramError::Disabled)
    }
}
