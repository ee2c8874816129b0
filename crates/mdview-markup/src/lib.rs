//! Markdown to HTML pipeline with diagram placeholder extraction.
//!
//! This crate turns semi-trusted markdown (optionally containing Mermaid
//! diagram blocks) into HTML that is safe to inject into a page. It is
//! purely synchronous; filling diagram placeholders is the job of
//! `mdview-diagrams`.
//!
//! # Architecture
//!
//! The pipeline is a fixed sequence of text-to-text passes:
//! 1. [`sanitize`]: strip non-content wrapper tags (`<think>…</think>` etc.)
//! 2. [`extract`]: replace diagram blocks with single-line placeholder
//!    containers carrying a base64 payload
//! 3. `convert`: code blocks, tables, lists, headings, emphasis, inline
//!    code, rules
//! 4. `paragraph`: wrap remaining text lines into `<p>` elements while
//!    placeholders and code blocks are held out as [`OpaqueSpans`]
//!
//! # Example
//!
//! ```
//! use mdview_markup::render_markdown;
//!
//! let result = render_markdown("# Title\n\n```mermaid\ngraph TD\nA-->B\n```");
//! assert!(result.html.starts_with("<h1>Title</h1>"));
//! assert_eq!(result.diagrams.len(), 1);
//! assert_eq!(result.diagrams[0].source, "graph TD\nA-->B");
//! ```

pub mod classify;
mod convert;
mod escape;
pub mod extract;
mod fence;
mod lines;
mod paragraph;
pub mod payload;
mod pipeline;
mod protect;
pub mod sanitize;

pub use escape::escape_html;
pub use extract::{DIAGRAM_FENCE_LANGUAGE, DiagramBlock, Extraction, extract_diagrams};
pub use lines::render_lines;
pub use payload::PayloadError;
pub use pipeline::{Pipeline, RenderedMarkup, render_markdown};
pub use protect::OpaqueSpans;
pub use sanitize::Sanitizer;
