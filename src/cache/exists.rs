//! File existence cache
//!
//! Keyed, populate-once cache over path existence, used to evaluate
//! `Exists(...)` condition predicates. The first query per normalized path
//! performs a real check; the answer is then pinned for the owning
//! context's lifetime even if the file later appears or disappears.
//! I/O failures distinct from plain "not found" surface as errors rather
//! than silently pinning `false`.

use std::path::Path;

use tracing::debug;

use super::key::{normalize_path, ExistsKey};
use super::populate::{CacheStats, OnceMap};
use super::{CacheError, CacheResult};
use crate::providers::ExistenceChecker;

/// Populate-once cache over normalized absolute paths.
#[derive(Debug, Default)]
pub struct FileExistenceCache {
    entries: OnceMap<ExistsKey, bool>,
}

impl FileExistenceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: OnceMap::new(),
        }
    }

    /// Check whether `path`, resolved against `base_dir`, exists.
    pub fn check(
        &self,
        base_dir: &Path,
        path: &Path,
        checker: &dyn ExistenceChecker,
    ) -> CacheResult<bool> {
        let key = normalize_path(base_dir, path);
        let probe = key.clone();
        self.entries.get_or_populate(key, move || {
            let exists = checker
                .exists(&probe)
                .map_err(|err| CacheError::io(&probe, err))?;
            debug!(path = %probe.display(), exists, "checked file existence");
            Ok(exists)
        })
    }

    /// Snapshot of this cache's activity.
    pub fn stats(&self) -> CacheStats {
        self.entries.stats()
    }
}
