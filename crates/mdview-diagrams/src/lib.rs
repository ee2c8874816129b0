//! Versioned asynchronous diagram rendering for mdview.
//!
//! The markdown pipeline in `mdview-markup` leaves one placeholder container
//! per diagram in its HTML. This crate fills those placeholders after the
//! HTML has been committed:
//!
//! - [`DiagramEngine`]: the external renderer (`renderDiagram(id, source)`)
//! - [`KrokiEngine`]: engine backed by a Kroki server, with a [`DiagramCache`]
//! - [`RenderSession`]: owns the committed [`Document`] and a generation
//!   counter; renders placeholders one at a time and drops results that
//!   arrive after the content was replaced
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mdview_diagrams::{KrokiEngine, RenderSession};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = KrokiEngine::new("https://kroki.io", Duration::from_secs(30));
//! let session = Arc::new(RenderSession::new(engine));
//!
//! let handle = session.submit("```mermaid\ngraph TD\nA-->B\n```");
//! handle.await.unwrap();
//! println!("{}", session.snapshot().html);
//! # }
//! ```

mod cache;
mod consts;
mod document;
mod engine;
mod error;
mod kroki;
mod session;

pub use cache::{DiagramCache, DiagramKey, FileCache, MemoryCache, NullCache};
pub use consts::{CACHE_VERSION, DEFAULT_RENDER_TIMEOUT, DEFAULT_TIMEOUT};
pub use document::{DiagramSlot, Document, SlotState};
pub use engine::{DiagramEngine, DisabledEngine, RenderedDiagram};
pub use error::DiagramError;
pub use kroki::KrokiEngine;
pub use session::{PassOutcome, RenderSession, Snapshot};
