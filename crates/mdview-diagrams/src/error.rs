//! Diagram rendering errors.

use std::time::Duration;

/// Failure to render a single diagram.
///
/// Never propagated out of a render session; a failed diagram is shown
/// inline with its source instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("render timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("diagram rendering is disabled")]
    Disabled,
    #[error("engine error: {0}")]
    Engine(String),
}
