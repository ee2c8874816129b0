//! Internal constants for diagram rendering.

use std::time::Duration;

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound on a single diagram render inside a session.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Kroki endpoint for Mermaid sources.
pub const MERMAID_ENDPOINT: &str = "mermaid";

/// Output format requested from Kroki.
pub const SVG_FORMAT: &str = "svg";

/// Version tag written to file caches; bump when cached markup changes shape.
pub const CACHE_VERSION: &str = "mdview-diagrams-1";
