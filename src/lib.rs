//! Girder evaluation-context caching layer
//!
//! Policy-driven reuse of the expensive per-evaluation side-caches of the
//! Girder build-evaluation engine: SDK name resolution, wildcard glob
//! expansion, and file-existence checks. A host creates one root
//! [`EvaluationContext`] per logical session and derives a working context
//! per evaluation; the [`SharingPolicy`] fixed at creation decides whether
//! derivations hand back one shared set of pinned caches (`Shared`) or a
//! fresh, empty set every time (`Isolated`). Cache entries populate
//! lazily, at most once per key per context, and are never recomputed for
//! the life of the owning context.

pub mod cache;
pub mod config;
pub mod context;
pub mod hook;
pub mod providers;

pub use cache::{
    CacheError, CacheResult, CacheStats, FileExistenceCache, GlobExpansionCache, GlobKey,
    SdkKey, SdkResolutionCache,
};
pub use config::{ConfigError, EvaluationConfig};
pub use context::{ContextId, ContextStats, EvaluationContext, SharingPolicy};
pub use hook::{
    clear_context_creation_hook, install_context_creation_hook, ContextCreationHook,
};
pub use providers::{
    ExistenceChecker, FilesystemChecker, FilesystemWalker, GlobWalker, Providers, SdkResolver,
};
