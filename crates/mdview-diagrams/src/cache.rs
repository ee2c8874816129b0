//! Diagram caching infrastructure.
//!
//! Provides a trait for diagram caching and implementations:
//! - [`DiagramCache`]: Trait for cache implementations
//! - [`NullCache`]: No-op cache (disabled caching)
//! - [`MemoryCache`]: Process-local cache, shared by sessions in one process
//! - [`FileCache`]: File-based cache with version validation

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

/// Diagram parameters for cache key computation.
///
/// Contains all parameters that affect the rendered diagram output.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Diagram source code.
    pub source: &'a str,
    /// Kroki endpoint (e.g., "mermaid").
    pub endpoint: &'a str,
    /// Output format (e.g., "svg").
    pub format: &'a str,
}

impl DiagramKey<'_> {
    /// Compute a content hash for this diagram key.
    ///
    /// # Hash Format
    ///
    /// SHA-256 of `"{endpoint}:{format}:{source}"`, hex-encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{}:{}:{}", self.endpoint, self.format, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let result = hasher.finalize();
        hex::encode(result)
    }
}

/// Trait for diagram caching implementations.
///
/// Implementations must be thread-safe; renders run on blocking worker threads.
pub trait DiagramCache: Send + Sync {
    /// Retrieve cached markup for `key`.
    fn get(&self, key: DiagramKey<'_>) -> Option<String>;

    /// Store rendered markup for `key`.
    fn set(&self, key: DiagramKey<'_>, content: &str);
}

/// No-op cache implementation.
///
/// Always returns cache misses and discards stored content.
#[derive(Debug, Default)]
pub struct NullCache;

impl DiagramCache for NullCache {
    fn get(&self, _key: DiagramKey<'_>) -> Option<String> {
        None
    }

    fn set(&self, _key: DiagramKey<'_>, _content: &str) {}
}

/// In-memory cache keyed by content hash.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagramCache for MemoryCache {
    fn get(&self, key: DiagramKey<'_>) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&key.compute_hash())
            .cloned()
    }

    fn set(&self, key: DiagramKey<'_>, content: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.compute_hash(), content.to_owned());
    }
}

/// File-based diagram cache.
///
/// Stores rendered diagrams as `{hash}.{format}` files under a root directory
/// that carries a `VERSION` file:
///
/// ```text
/// {root}/
/// +-- VERSION        # cache version string
/// +-- 3f2a…e1.svg    # one file per rendered diagram
/// ```
///
/// On construction the `VERSION` file is validated; if it is missing or holds
/// a different version, the whole directory is wiped and recreated.
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Create a file cache rooted at `root`, validating the cache version.
    ///
    /// Errors during validation are logged but never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }

    fn entry_path(&self, key: DiagramKey<'_>) -> PathBuf {
        self.root.join(format!("{}.{}", key.compute_hash(), key.format))
    }
}

impl DiagramCache for FileCache {
    fn get(&self, key: DiagramKey<'_>) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: DiagramKey<'_>, content: &str) {
        let path = self.entry_path(key);
        if let Err(e) = fs::create_dir_all(&self.root) {
            tracing::debug!("failed to create diagram cache directory: {e}");
            return;
        }
        // Cache misses re-render through the engine, so write errors are only logged
        if let Err(e) = fs::write(&path, content) {
            tracing::debug!(path = %path.display(), "failed to write diagram cache entry: {e}");
        }
    }
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("diagram cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                "diagram cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no diagram cache VERSION file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove diagram cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create diagram cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write diagram cache VERSION file: {e}");
    }
}
