//! Glob expansion cache
//!
//! The most involved of the three side-caches. Expansions are keyed by the
//! normalized absolute base directory plus the normalized wildcard
//! remainder, never by the requesting project, so two projects that point
//! the same pattern at the same directory, one with a relative spec and
//! one absolute, share a single walk and a single pinned result. Wildcarded
//! item inclusion and wildcarded import resolution both route through the
//! same entry point. The ordered path list captured by the first walk is
//! served unchanged for the owning context's lifetime regardless of
//! intervening filesystem mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::key::GlobKey;
use super::populate::{CacheStats, OnceMap};
use super::CacheResult;
use crate::providers::GlobWalker;

/// Populate-once cache over normalized (base directory, pattern) keys.
#[derive(Debug, Default)]
pub struct GlobExpansionCache {
    entries: OnceMap<GlobKey, Arc<Vec<PathBuf>>>,
}

impl GlobExpansionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: OnceMap::new(),
        }
    }

    /// Expand a wildcard itemspec issued from `base_dir`.
    ///
    /// The first request per key performs the walk; later requests return
    /// the pinned list. Walk and pattern errors surface to the requester
    /// without populating the key and without touching other entries.
    pub fn expand(
        &self,
        base_dir: &Path,
        spec: &str,
        walker: &dyn GlobWalker,
    ) -> CacheResult<Arc<Vec<PathBuf>>> {
        let key = GlobKey::from_spec(base_dir, spec);
        let walk = key.clone();
        self.entries.get_or_populate(key, move || {
            let paths = walker.expand(&walk.base_dir, &walk.pattern)?;
            debug!(
                base_dir = %walk.base_dir.display(),
                pattern = %walk.pattern,
                matched = paths.len(),
                "expanded glob"
            );
            Ok(Arc::new(paths))
        })
    }

    /// Snapshot of this cache's activity.
    pub fn stats(&self) -> CacheStats {
        self.entries.stats()
    }
}
