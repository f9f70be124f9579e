//! SDK resolution cache
//!
//! Keyed, populate-once cache over SDK name/version resolution. On a miss
//! the host's ordered resolver list is consulted in sequence and the first
//! success is pinned; on a hit no resolver runs at all, so re-resolving
//! the same reference within one context costs exactly one resolver
//! invocation for the context's lifetime. A lookup no resolver can satisfy
//! fails without populating the key, so a later lookup (for example from
//! another project sharing the context) retries from scratch.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::key::SdkKey;
use super::populate::{CacheStats, OnceMap};
use super::{CacheError, CacheResult};
use crate::providers::SdkResolver;

/// Populate-once cache over SDK references.
#[derive(Debug, Default)]
pub struct SdkResolutionCache {
    entries: OnceMap<SdkKey, PathBuf>,
}

impl SdkResolutionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: OnceMap::new(),
        }
    }

    /// Resolve an SDK reference through the cache.
    pub fn resolve(
        &self,
        name: &str,
        version: Option<&str>,
        resolvers: &[Arc<dyn SdkResolver>],
    ) -> CacheResult<PathBuf> {
        let key = SdkKey::new(name, version);
        let request = key.clone();
        self.entries.get_or_populate(key, move || {
            for resolver in resolvers {
                if let Some(path) = resolver.resolve(&request.name, request.version.as_deref()) {
                    debug!(sdk = %request, path = %path.display(), "resolved SDK");
                    return Ok(path);
                }
            }
            Err(CacheError::UnresolvedSdk(request))
        })
    }

    /// Snapshot of this cache's activity.
    pub fn stats(&self) -> CacheStats {
        self.entries.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver over a fixed table that counts invocations.
    struct TableResolver {
        table: HashMap<String, PathBuf>,
        calls: AtomicUsize,
    }

    impl TableResolver {
        fn new(entries: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                table: entries
                    .iter()
                    .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SdkResolver for TableResolver {
        fn resolve(&self, name: &str, _version: Option<&str>) -> Option<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table.get(name).cloned()
        }
    }

    fn as_resolvers(list: &[Arc<TableResolver>]) -> Vec<Arc<dyn SdkResolver>> {
        list.iter()
            .map(|r| Arc::clone(r) as Arc<dyn SdkResolver>)
            .collect()
    }

    #[test]
    fn test_first_resolver_wins() {
        let first = TableResolver::new(&[("widgets", "/sdks/first/widgets")]);
        let second = TableResolver::new(&[("widgets", "/sdks/second/widgets")]);
        let resolvers = as_resolvers(&[Arc::clone(&first), Arc::clone(&second)]);
        let cache = SdkResolutionCache::new();

        let path = cache.resolve("widgets", None, &resolvers).unwrap();

        assert_eq!(path, PathBuf::from("/sdks/first/widgets"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0, "later resolvers are not consulted");
    }

    #[test]
    fn test_falls_back_to_later_resolver() {
        let first = TableResolver::new(&[]);
        let second = TableResolver::new(&[("widgets", "/sdks/widgets")]);
        let resolvers = as_resolvers(&[Arc::clone(&first), Arc::clone(&second)]);
        let cache = SdkResolutionCache::new();

        let path = cache.resolve("widgets", None, &resolvers).unwrap();

        assert_eq!(path, PathBuf::from("/sdks/widgets"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[test]
    fn test_hit_invokes_no_resolver() {
        let resolver = TableResolver::new(&[("widgets", "/sdks/widgets")]);
        let resolvers = as_resolvers(&[Arc::clone(&resolver)]);
        let cache = SdkResolutionCache::new();

        for _ in 0..5 {
            cache.resolve("widgets", None, &resolvers).unwrap();
        }

        assert_eq!(resolver.calls(), 1, "one invocation for the context's lifetime");
    }

    #[test]
    fn test_unresolved_key_is_retryable() {
        let empty = as_resolvers(&[TableResolver::new(&[])]);
        let cache = SdkResolutionCache::new();

        let err = cache.resolve("widgets", None, &empty).unwrap_err();
        assert!(matches!(err, CacheError::UnresolvedSdk(_)));
        assert_eq!(cache.stats().entries, 0);

        // The same key retried against a resolver that knows it succeeds:
        // no negative caching.
        let knows = as_resolvers(&[TableResolver::new(&[("widgets", "/sdks/widgets")])]);
        let path = cache.resolve("widgets", None, &knows).unwrap();
        assert_eq!(path, PathBuf::from("/sdks/widgets"));
    }

    #[test]
    fn test_versions_are_distinct_keys() {
        let resolver = TableResolver::new(&[("widgets", "/sdks/widgets")]);
        let resolvers = as_resolvers(&[Arc::clone(&resolver)]);
        let cache = SdkResolutionCache::new();

        cache.resolve("widgets", None, &resolvers).unwrap();
        cache.resolve("widgets", Some("1.0"), &resolvers).unwrap();
        cache.resolve("widgets", Some("2.0"), &resolvers).unwrap();
        cache.resolve("widgets", Some("1.0"), &resolvers).unwrap();

        assert_eq!(resolver.calls(), 3);
        assert_eq!(cache.stats().entries, 3);
    }

    #[test]
    fn test_no_resolvers_fails() {
        let cache = SdkResolutionCache::new();
        let err = cache.resolve("widgets", None, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no resolver could resolve SDK 'widgets'"
        );
    }
}
