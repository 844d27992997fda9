//! Coordinator configuration, loadable from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! debug_mode = true
//! debug_prefix = "[SYSTEM]"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, ColloquyResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// When set, coordinator diagnostics are also interjected into the
    /// message log as system messages.
    pub debug_mode: bool,
    /// Prefix of interjected diagnostic messages.
    pub debug_prefix: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            debug_prefix: "[SYSTEM]".to_string(),
        }
    }
}

impl CoordinatorConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `ColloquyError::ConfigError` if the document is malformed.
    pub fn from_toml_str(s: &str) -> ColloquyResult<Self> {
        toml::from_str(s).map_err(|e| ColloquyError::ConfigError {
            reason: format!("failed to parse coordinator TOML: {}", e),
        })
    }

    /// Read and parse the TOML file at `path`.
    pub fn from_file(path: &Path) -> ColloquyResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ColloquyError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}
