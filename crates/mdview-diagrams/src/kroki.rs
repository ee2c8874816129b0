//! Kroki diagram engine.
//!
//! Renders Mermaid sources to SVG by POSTing them to a Kroki server:
//! - HTTP requests run on the blocking thread pool (`ureq` is synchronous)
//! - One HTTP agent is shared process-wide for connection pooling
//! - Successful renders are stored in a [`DiagramCache`] keyed by content hash

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use regex::Regex;
use ureq::Agent;

use crate::cache::{DiagramCache, DiagramKey, NullCache};
use crate::consts::{DEFAULT_TIMEOUT, MERMAID_ENDPOINT, SVG_FORMAT};
use crate::engine::{DiagramEngine, RenderedDiagram};
use crate::error::DiagramError;

static XML_PROLOG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\?xml[^>]*\?>\s*(?:<!DOCTYPE[^>]*>\s*)?").unwrap());

static GOOGLE_FONTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@import\s+url\([^)]*fonts\.googleapis\.com[^)]*\)\s*;?").unwrap()
});

static SHARED_AGENTS: LazyLock<Mutex<HashMap<Duration, Agent>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Create HTTP agent with the specified timeout.
///
/// HTTP error statuses are returned as responses so the error body can be
/// reported.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Process-wide HTTP agent for `timeout`, created on first use.
///
/// Engines with the same timeout share one agent and its connection pool.
fn shared_agent(timeout: Duration) -> Agent {
    let mut agents = SHARED_AGENTS.lock().unwrap();
    agents
        .entry(timeout)
        .or_insert_with(|| {
            tracing::debug!(timeout_ms = timeout.as_millis(), "Creating Kroki HTTP agent");
            create_agent(timeout)
        })
        .clone()
}

/// Diagram engine backed by a Kroki server.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use mdview_diagrams::{KrokiEngine, MemoryCache};
///
/// let engine = KrokiEngine::new("https://kroki.io", Duration::from_secs(10))
///     .with_cache(Arc::new(MemoryCache::new()));
/// ```
pub struct KrokiEngine {
    server_url: String,
    agent: Agent,
    cache: Arc<dyn DiagramCache>,
}

impl KrokiEngine {
    /// Create an engine for `server_url` with the given HTTP timeout.
    ///
    /// Engines created with the same timeout share one HTTP agent.
    #[must_use]
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url: String = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_owned(),
            agent: shared_agent(timeout),
            cache: Arc::new(NullCache),
        }
    }

    /// Create an engine with the default HTTP timeout.
    #[must_use]
    pub fn with_default_timeout(server_url: impl Into<String>) -> Self {
        Self::new(server_url, DEFAULT_TIMEOUT)
    }

    /// Set the cache for rendered SVGs.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn DiagramCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Kroki server URL without trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl DiagramEngine for KrokiEngine {
    async fn render(&self, id: &str, source: &str) -> Result<RenderedDiagram, DiagramError> {
        let agent = self.agent.clone();
        let server_url = self.server_url.clone();
        let cache = Arc::clone(&self.cache);
        let source = source.to_owned();

        let svg = tokio::task::spawn_blocking(move || {
            render_cached(&agent, &server_url, cache.as_ref(), &source)
        })
        .await
        .map_err(|e| DiagramError::Engine(format!("render task failed: {e}")))??;

        tracing::debug!(id, bytes = svg.len(), "Rendered diagram via Kroki");
        Ok(RenderedDiagram::new(svg))
    }
}

/// Look up `source` in the cache, rendering and storing it on a miss.
fn render_cached(
    agent: &Agent,
    server_url: &str,
    cache: &dyn DiagramCache,
    source: &str,
) -> Result<String, DiagramError> {
    let key = DiagramKey {
        source,
        endpoint: MERMAID_ENDPOINT,
        format: SVG_FORMAT,
    };
    if let Some(svg) = cache.get(key) {
        tracing::trace!(hash = %key.compute_hash(), "Diagram cache hit");
        return Ok(svg);
    }

    let data = send_diagram_request(agent, server_url, source)?;
    let svg = String::from_utf8(data)
        .map_err(|e| DiagramError::Io(format!("invalid UTF-8 in SVG: {e}")))?;
    let svg = clean_svg(&svg);

    cache.set(key, &svg);
    Ok(svg)
}

/// Send a diagram to Kroki and return the response body as bytes.
///
/// Handles HTTP errors by reading the response body for error details.
fn send_diagram_request(
    agent: &Agent,
    server_url: &str,
    source: &str,
) -> Result<Vec<u8>, DiagramError> {
    let url = format!("{server_url}/{MERMAID_ENDPOINT}/{SVG_FORMAT}");

    let response = agent
        .post(&url)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())
        .map_err(|e| DiagramError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        return Err(DiagramError::Http(format!(
            "HTTP {status}: {}",
            error_body.trim()
        )));
    }

    body.read_to_vec()
        .map_err(|e| DiagramError::Io(e.to_string()))
}

/// Prepare SVG for inline embedding.
///
/// Drops the XML prolog and doctype (invalid inside HTML) and Google Fonts
/// imports (external requests).
fn clean_svg(svg: &str) -> String {
    let without_prolog = XML_PROLOG_RE.replace(svg, "");
    GOOGLE_FONTS_RE
        .replace_all(&without_prolog, "")
        .trim()
        .to_owned()
}
