//! Diagram engine selection from configuration.

use std::sync::Arc;

use mdview_config::Config;
use mdview_diagrams::{
    CACHE_VERSION, DiagramCache, DiagramEngine, DiagramError, DisabledEngine, FileCache,
    KrokiEngine, NullCache, RenderSession, RenderedDiagram,
};
use mdview_markup::{Pipeline, Sanitizer};

/// Engine chosen by `diagrams.enabled`.
pub(crate) enum Engine {
    Kroki(KrokiEngine),
    Disabled(DisabledEngine),
}

impl Engine {
    /// Build the engine described by `config`.
    pub(crate) fn from_config(config: &Config) -> Self {
        if !config.diagrams.enabled {
            tracing::info!("Diagram rendering disabled");
            return Self::Disabled(DisabledEngine);
        }

        let cache: Arc<dyn DiagramCache> = if config.cache_resolved.enabled {
            let dir = config.cache_resolved.dir.join("diagrams");
            tracing::info!(dir = %dir.display(), "Using diagram cache");
            Arc::new(FileCache::new(dir, CACHE_VERSION))
        } else {
            Arc::new(NullCache)
        };

        tracing::info!(url = %config.diagrams.kroki_url, "Rendering diagrams via Kroki");
        Self::Kroki(
            KrokiEngine::new(&config.diagrams.kroki_url, config.diagrams.timeout())
                .with_cache(cache),
        )
    }
}

impl DiagramEngine for Engine {
    async fn render(&self, id: &str, source: &str) -> Result<RenderedDiagram, DiagramError> {
        match self {
            Self::Kroki(engine) => engine.render(id, source).await,
            Self::Disabled(engine) => engine.render(id, source).await,
        }
    }
}

/// Build a render session for `config`.
pub(crate) fn build_session(config: &Config) -> RenderSession<Engine> {
    let sanitizer = Sanitizer::with_extra_tags(config.render.strip_tags.iter().map(String::as_str));
    RenderSession::new(Engine::from_config(config))
        .with_pipeline(Pipeline::with_sanitizer(sanitizer))
        .with_render_timeout(config.diagrams.timeout())
}
