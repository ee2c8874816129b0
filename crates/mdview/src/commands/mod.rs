//! CLI command implementations.

pub(crate) mod lines;
pub(crate) mod render;
pub(crate) mod watch;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use mdview_config::{CliSettings, Config};

use crate::error::CliError;

pub(crate) use lines::LinesArgs;
pub(crate) use render::RenderArgs;
pub(crate) use watch::WatchArgs;

/// Configuration arguments shared by commands that render diagrams.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover mdview.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "MDVIEW_KROKI_URL")]
    kroki_url: Option<String>,

    /// Show diagrams as source instead of rendering them.
    #[arg(long)]
    no_diagrams: bool,

    /// Per-diagram render timeout in seconds (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable caching (default: enabled).
    #[arg(long)]
    cache: Option<bool>,

    /// Disable caching.
    #[arg(long, conflicts_with = "cache")]
    no_cache: bool,
}

impl ConfigArgs {
    /// Load configuration with these arguments applied as overrides.
    pub(crate) fn load(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            kroki_url: self.kroki_url.clone(),
            diagrams_enabled: self.no_diagrams.then_some(false),
            timeout_secs: self.timeout,
            cache_enabled: self.resolve_cache_enabled(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Resolve `cache_enabled` from --cache/--no-cache flags.
    fn resolve_cache_enabled(&self) -> Option<bool> {
        self.no_cache.then_some(false).or(self.cache)
    }
}

/// Write `html` to `path`, or to stdout when no path is given.
pub(crate) fn write_output(path: Option<&Path>, html: &str) -> Result<(), CliError> {
    if let Some(path) = path {
        std::fs::write(path, html)?;
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(html.as_bytes())?;
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
