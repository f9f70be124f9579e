//! Collaborator contracts consumed by the evaluation context
//!
//! The context does not implement SDK resolution or glob matching itself;
//! it routes through these traits. `FilesystemWalker` and
//! `FilesystemChecker` are the stock implementations a host gets unless it
//! injects its own. SDK resolvers always come from the host; plugin
//! loading is outside this layer, which only sees an ordered list.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::GlobBuilder;
use walkdir::WalkDir;

use crate::cache::{CacheError, CacheResult};

/// One SDK resolver in the host's ordered resolver list.
///
/// Returning `None` means this resolver does not know the SDK and the next
/// resolver in the list is consulted.
pub trait SdkResolver: Send + Sync {
    /// Map an SDK reference to the root path of the resolved SDK.
    fn resolve(&self, name: &str, version: Option<&str>) -> Option<PathBuf>;
}

/// Expands a wildcard pattern under a base directory into matching paths.
pub trait GlobWalker: Send + Sync {
    /// `pattern` uses `/` separators; `*` and `?` stay within one path
    /// segment and `**` crosses segments. Results are absolute, and their
    /// order is the order every later lookup for the same key observes.
    fn expand(&self, base_dir: &Path, pattern: &str) -> CacheResult<Vec<PathBuf>>;
}

/// Answers existence checks for `Exists(...)` conditions.
pub trait ExistenceChecker: Send + Sync {
    /// Failures distinct from plain "not found" must surface as `Err`,
    /// never resolve to `false`.
    fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// Stock walker: globset matcher over a walkdir traversal sorted by file
/// name, yielding files only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemWalker;

impl GlobWalker for FilesystemWalker {
    fn expand(&self, base_dir: &Path, pattern: &str) -> CacheResult<Vec<PathBuf>> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| CacheError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        let matcher = glob.compile_matcher();

        // A project may glob a directory that does not exist yet; that is
        // an empty expansion, not an error.
        match base_dir.try_exists() {
            Ok(true) => {}
            Ok(false) => return Ok(Vec::new()),
            Err(err) => return Err(CacheError::io(base_dir, err)),
        }

        let mut matched = Vec::new();
        for entry in WalkDir::new(base_dir).sort_by_file_name() {
            let entry = entry.map_err(|err| walk_error(base_dir, err))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(base_dir) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            if matcher.is_match(relative) {
                matched.push(entry.into_path());
            }
        }

        Ok(matched)
    }
}

fn walk_error(base_dir: &Path, err: walkdir::Error) -> CacheError {
    let path = err.path().unwrap_or(base_dir).to_path_buf();
    let cause = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
    CacheError::io(path, cause)
}

/// Stock existence checker backed by the real filesystem.
///
/// `try_exists` distinguishes "not found" from I/O failure, which keeps
/// permission errors from being pinned as `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemChecker;

impl ExistenceChecker for FilesystemChecker {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }
}

/// The collaborator set threaded through a context and its derivations.
#[derive(Clone)]
pub struct Providers {
    /// Ordered SDK resolver list; first success wins
    pub sdk_resolvers: Vec<Arc<dyn SdkResolver>>,
    /// Walker used for wildcard item and import expansion
    pub glob_walker: Arc<dyn GlobWalker>,
    /// Checker used for `Exists(...)` conditions
    pub existence_checker: Arc<dyn ExistenceChecker>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            sdk_resolvers: Vec::new(),
            glob_walker: Arc::new(FilesystemWalker),
            existence_checker: Arc::new(FilesystemChecker),
        }
    }
}

impl Providers {
    /// Stock filesystem collaborators and no SDK resolvers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ordered SDK resolver list.
    pub fn with_sdk_resolvers(mut self, resolvers: Vec<Arc<dyn SdkResolver>>) -> Self {
        self.sdk_resolvers = resolvers;
        self
    }

    /// Replace the glob walker.
    pub fn with_glob_walker(mut self, walker: Arc<dyn GlobWalker>) -> Self {
        self.glob_walker = walker;
        self
    }

    /// Replace the existence checker.
    pub fn with_existence_checker(mut self, checker: Arc<dyn ExistenceChecker>) -> Self {
        self.existence_checker = checker;
        self
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("sdk_resolvers", &self.sdk_resolvers.len())
            .finish_non_exhaustive()
    }
}
