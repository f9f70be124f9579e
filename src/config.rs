//! Host-facing configuration
//!
//! Resolves the evaluation settings a host passes down to this layer from
//! an optional TOML document (the `[evaluation]` table of the engine's
//! config file) overlaid on built-in defaults. A missing file or table
//! means defaults; unknown keys inside `[evaluation]` are rejected, while
//! tables belonging to other engine subsystems are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{EvaluationContext, SharingPolicy};

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Effective evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Context sharing policy for evaluation side-caches
    pub context_sharing: SharingPolicy,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            context_sharing: SharingPolicy::Isolated,
        }
    }
}

/// On-disk `[evaluation]` table: every field optional, `None` keeps the
/// built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluationOverlay {
    context_sharing: Option<SharingPolicy>,
}

/// Whole config document. Tables other than `[evaluation]` belong to other
/// engine subsystems and pass through unexamined.
#[derive(Debug, Default, Deserialize)]
struct ConfigDoc {
    #[serde(default)]
    evaluation: EvaluationOverlay,
}

impl EvaluationConfig {
    /// Parse a TOML document and overlay its `[evaluation]` table on the
    /// defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let doc: ConfigDoc = toml::from_str(text)?;
        Ok(Self::default().apply(doc.evaluation))
    }

    /// Load from a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn apply(mut self, overlay: EvaluationOverlay) -> Self {
        if let Some(policy) = overlay.context_sharing {
            self.context_sharing = policy;
        }
        self
    }

    /// Create the root context these settings call for.
    pub fn create_context(&self) -> EvaluationContext {
        EvaluationContext::new(self.context_sharing)
    }
}
