//! Cache key primitives for the evaluation side-caches
//!
//! All three caches key on normalized forms so that two projects authoring
//! the same logical location differently (relative vs absolute paths,
//! `.`/`..` segments, backslash separators) land on the same entry. Glob
//! keys deliberately carry no trace of the requesting project: identical
//! patterns against the same directory share one entry no matter which
//! project issued them.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Key for one SDK resolution: name plus optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SdkKey {
    /// SDK name as authored in the project file
    pub name: String,
    /// Version constraint, if the host distinguishes versions
    pub version: Option<String>,
}

impl SdkKey {
    /// Create a key from an SDK reference.
    pub fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(|v| v.to_string()),
        }
    }
}

impl fmt::Display for SdkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Key for one glob expansion: normalized absolute base directory plus
/// normalized wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobKey {
    /// Fixed directory the walk starts from
    pub base_dir: PathBuf,
    /// Wildcard remainder, `/`-separated
    pub pattern: String,
}

impl GlobKey {
    /// Build a key from a project-authored itemspec.
    ///
    /// The spec's leading non-wildcard segments form a fixed directory
    /// prefix; that prefix is resolved against `base_dir` and normalized,
    /// and the remainder starting at the first wildcard segment becomes the
    /// pattern. A spec without any wildcard keys on its parent directory
    /// with the final segment as an exact-match pattern.
    pub fn from_spec(base_dir: &Path, spec: &str) -> Self {
        let spec = spec.replace('\\', "/");
        let (prefix, pattern) = split_at_wildcard(&spec);
        // A spec anchored at the root keeps its root prefix even when the
        // split leaves it textually empty ("/*.cs").
        let prefix = if prefix.is_empty() && spec.starts_with('/') {
            "/"
        } else {
            prefix
        };
        let base_dir = normalize_path(base_dir, Path::new(prefix));
        Self {
            base_dir,
            pattern: pattern.to_string(),
        }
    }
}

impl fmt::Display for GlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.base_dir.display(), self.pattern)
    }
}

/// Key for one existence check: normalized absolute path.
pub type ExistsKey = PathBuf;

/// Split a `/`-separated spec into its fixed directory prefix and the
/// remainder starting at the first wildcard-bearing segment.
fn split_at_wildcard(spec: &str) -> (&str, &str) {
    for (index, segment) in spec.split('/').enumerate() {
        if segment.contains(['*', '?']) {
            return match index {
                0 => ("", spec),
                _ => {
                    let offset: usize =
                        spec.split('/').take(index).map(|s| s.len() + 1).sum();
                    (&spec[..offset - 1], &spec[offset..])
                }
            };
        }
    }

    // No wildcard: the final segment is an exact-match pattern against its
    // parent directory.
    match spec.rfind('/') {
        Some(slash) => (&spec[..slash], &spec[slash + 1..]),
        None => ("", spec),
    }
}

/// Resolve `path` against `base_dir` and collapse `.`/`..` lexically.
///
/// Purely textual: no filesystem access and no symlink resolution, so the
/// same authored location always produces the same key regardless of disk
/// state. Callers pass absolute base directories; a relative base is
/// normalized as written.
pub fn normalize_path(base_dir: &Path, path: &Path) -> PathBuf {
    let joined = if path.as_os_str().is_empty() {
        base_dir.to_path_buf()
    } else if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };

    let mut parts: Vec<Component> = Vec::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `..` cannot climb above the filesystem root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().map(|c| c.as_os_str()).collect()
}
