//! Evaluation contexts
//!
//! An `EvaluationContext` owns the three evaluation side-caches and a
//! sharing policy fixed at creation. Hosts create one root context per
//! logical session and derive a working context for every evaluation:
//! under `Shared` the derivation hands back the same instance, so the
//! pinned caches are reused across evaluations; under `Isolated` every
//! evaluation gets a fresh instance with empty caches. A host evaluation
//! call that carries no context at all gets a brand-new isolated context
//! every time: cached state never leaks between evaluations unless the
//! host explicitly threads one context through.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cache::{
    CacheResult, CacheStats, FileExistenceCache, GlobExpansionCache, SdkResolutionCache,
};
use crate::hook;
use crate::providers::Providers;

/// Context sharing policy, fixed at context creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingPolicy {
    /// One context and its pinned caches are reused across evaluations
    Shared,
    /// Every evaluation derives a fresh context with empty caches
    #[default]
    Isolated,
}

impl SharingPolicy {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shared" => Some(Self::Shared),
            "isolated" => Some(Self::Isolated),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Isolated => "isolated",
        }
    }
}

/// Stable identity of one context object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ContextInner {
    id: ContextId,
    policy: SharingPolicy,
    created_at: DateTime<Utc>,
    providers: Providers,
    sdk: SdkResolutionCache,
    glob: GlobExpansionCache,
    exists: FileExistenceCache,
}

/// Handle to one evaluation context.
///
/// Clones share the same identity and the same caches; a genuinely new
/// context only comes from `new`, `with_providers`, an `Isolated`
/// derivation, or `for_evaluation(None)`.
#[derive(Clone)]
pub struct EvaluationContext {
    inner: Arc<ContextInner>,
}

impl EvaluationContext {
    /// Create a root context with stock filesystem collaborators and no
    /// SDK resolvers.
    pub fn new(policy: SharingPolicy) -> Self {
        Self::with_providers(policy, Providers::default())
    }

    /// Create a root context with an explicit collaborator set.
    pub fn with_providers(policy: SharingPolicy, providers: Providers) -> Self {
        let context = Self {
            inner: Arc::new(ContextInner {
                id: ContextId::new(),
                policy,
                created_at: Utc::now(),
                providers,
                sdk: SdkResolutionCache::new(),
                glob: GlobExpansionCache::new(),
                exists: FileExistenceCache::new(),
            }),
        };
        debug!(
            id = %context.id(),
            policy = context.policy().as_str(),
            "created evaluation context"
        );
        hook::notify_context_created(&context);
        context
    }

    /// Derive the working context for one evaluation.
    ///
    /// `Shared` returns this same context; `Isolated` returns a fresh one
    /// with the same policy and collaborators and empty caches. Call once
    /// per logical evaluation unit; caching the result across evaluations
    /// would defeat the isolation rule.
    pub fn derive_for_evaluation(&self) -> Self {
        match self.policy() {
            SharingPolicy::Shared => self.clone(),
            SharingPolicy::Isolated => {
                Self::with_providers(SharingPolicy::Isolated, self.inner.providers.clone())
            }
        }
    }

    /// Working context for a host evaluation call that may not carry one.
    ///
    /// `None` allocates a brand-new isolated context on every call,
    /// including re-evaluations of the same project, so side-caches are
    /// reused only when the host explicitly threads a context through.
    pub fn for_evaluation(existing: Option<&Self>) -> Self {
        match existing {
            Some(context) => context.derive_for_evaluation(),
            None => Self::new(SharingPolicy::Isolated),
        }
    }

    /// Stable identity of this context.
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The sharing policy fixed at creation.
    pub fn policy(&self) -> SharingPolicy {
        self.inner.policy
    }

    /// When this context object was constructed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// True when both handles refer to the same context object.
    pub fn same_context(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve an SDK reference through this context's cache.
    pub fn resolve_sdk(&self, name: &str, version: Option<&str>) -> CacheResult<PathBuf> {
        self.inner
            .sdk
            .resolve(name, version, &self.inner.providers.sdk_resolvers)
    }

    /// Expand a wildcard itemspec issued from `base_dir`.
    ///
    /// Serves wildcarded item inclusion and wildcarded import resolution
    /// alike.
    pub fn expand_glob(&self, base_dir: &Path, spec: &str) -> CacheResult<Arc<Vec<PathBuf>>> {
        self.inner
            .glob
            .expand(base_dir, spec, self.inner.providers.glob_walker.as_ref())
    }

    /// Evaluate an `Exists(...)` predicate for `path` against `base_dir`.
    pub fn check_exists(&self, base_dir: &Path, path: &Path) -> CacheResult<bool> {
        self.inner.exists.check(
            base_dir,
            path,
            self.inner.providers.existence_checker.as_ref(),
        )
    }

    /// Diagnostic snapshot of this context's cache activity.
    pub fn stats(&self) -> ContextStats {
        ContextStats {
            id: self.id().to_string(),
            policy: self.policy(),
            created_at: self.created_at(),
            sdk: self.inner.sdk.stats(),
            glob: self.inner.glob.stats(),
            exists: self.inner.exists.stats(),
        }
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("id", &self.id())
            .field("policy", &self.policy())
            .field("created_at", &self.created_at())
            .finish_non_exhaustive()
    }
}

/// Diagnostic snapshot of one context.
#[derive(Debug, Clone, Serialize)]
pub struct ContextStats {
    /// Context identity
    pub id: String,
    /// Sharing policy
    pub policy: SharingPolicy,
    /// Construction time
    pub created_at: DateTime<Utc>,
    /// SDK resolution cache activity
    pub sdk: CacheStats,
    /// Glob expansion cache activity
    pub glob: CacheStats,
    /// File existence cache activity
    pub exists: CacheStats,
}
