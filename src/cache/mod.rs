//! Evaluation side-caches
//!
//! The three populate-once caches owned by an evaluation context: SDK
//! resolution, glob expansion, and file existence. Entries are added on
//! first lookup and never removed or overwritten for the life of the
//! owning context, so later real-world changes stay invisible to that
//! context. A failed population leaves its key unpopulated and eligible
//! for retry; there is no negative caching.

mod exists;
mod glob;
mod key;
mod populate;
mod sdk;

pub use exists::FileExistenceCache;
pub use glob::GlobExpansionCache;
pub use key::{normalize_path, ExistsKey, GlobKey, SdkKey};
pub use populate::{CacheStats, OnceMap};
pub use sdk::SdkResolutionCache;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Cache result type
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from cache population.
///
/// `Clone` so a single failed population can be handed to every caller
/// that coalesced on the same key. The I/O cause is held behind `Arc` for
/// the same reason, and the field is named `cause` rather than `source`
/// because `Arc<io::Error>` does not implement `std::error::Error`.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// No resolver in the host's ordered list produced a path
    #[error("no resolver could resolve SDK '{0}'")]
    UnresolvedSdk(SdkKey),

    /// The wildcard pattern does not compile
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    /// Filesystem failure during a walk or existence check
    #[error("I/O error at {}: {}", .path.display(), .cause)]
    Io {
        path: PathBuf,
        cause: Arc<std::io::Error>,
    },
}

impl CacheError {
    /// I/O failure tied to the path being inspected.
    pub fn io(path: impl Into<PathBuf>, cause: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            cause: Arc::new(cause),
        }
    }
}
