//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use girder_eval_context::{
    CacheResult, FilesystemWalker, GlobWalker, Providers, SdkResolver,
};

/// SDK resolver over a fixed name→path table that counts invocations per
/// name.
pub struct CountingResolver {
    table: HashMap<String, PathBuf>,
    calls: Mutex<HashMap<String, usize>>,
}

impl CountingResolver {
    pub fn new(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            table: entries
                .iter()
                .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
                .collect(),
            calls: Mutex::new(HashMap::new()),
        })
    }

    /// Resolver invocations recorded for `name`.
    pub fn calls_for(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl SdkResolver for CountingResolver {
    fn resolve(&self, name: &str, _version: Option<&str>) -> Option<PathBuf> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += 1;
        self.table.get(name).cloned()
    }
}

/// Walker that counts walks and delegates to the stock filesystem walker.
#[derive(Default)]
pub struct CountingWalker {
    walks: AtomicUsize,
    inner: FilesystemWalker,
}

impl CountingWalker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Filesystem walks performed so far.
    pub fn walks(&self) -> usize {
        self.walks.load(Ordering::SeqCst)
    }
}

impl GlobWalker for CountingWalker {
    fn expand(&self, base_dir: &Path, pattern: &str) -> CacheResult<Vec<PathBuf>> {
        self.walks.fetch_add(1, Ordering::SeqCst);
        self.inner.expand(base_dir, pattern)
    }
}

/// Providers wired with a counting resolver and a counting walker.
pub fn counting_providers(
    resolver: &Arc<CountingResolver>,
    walker: &Arc<CountingWalker>,
) -> Providers {
    Providers::new()
        .with_sdk_resolvers(vec![Arc::clone(resolver) as Arc<dyn SdkResolver>])
        .with_glob_walker(Arc::clone(walker) as Arc<dyn GlobWalker>)
}

/// File names of the matched paths, in match order.
pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}
