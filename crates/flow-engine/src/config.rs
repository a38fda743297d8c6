//! Runner configuration
//!
//! Controls how strictly definitions are checked while building. Only
//! port validation is on by default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, LoadError};

/// Build-time checks applied by the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunnerConfig {
    /// Reject definitions whose links form a cycle
    pub detect_cycles: bool,
    /// Fail instead of skipping connections to unknown nodes
    pub strict_targets: bool,
    /// Check port maps against both nodes' contracts
    pub validate_ports: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            detect_cycles: false,
            strict_targets: false,
            validate_ports: true,
        }
    }
}

impl RunnerConfig {
    /// Strictest settings: every optional check enabled
    pub fn strict() -> Self {
        Self {
            detect_cycles: true,
            strict_targets: true,
            validate_ports: true,
        }
    }

    /// Read a JSON config file; missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(LoadError::Parse)?;
        Ok(config)
    }
}
