//! Connection and walk configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ReportError;
use crate::path::IndexPath;

/// Order in which queued directories are visited.
///
/// Only the order of reports in the output depends on this; the set of
/// visited directories is the same either way.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TraversalOrder {
    /// Stack: the most recently discovered directory is visited next.
    #[default]
    Lifo,
    /// Queue: directories are visited in discovery order, level by level.
    Fifo,
}

/// What to do when a query for one node fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the walk at the first failure.
    #[default]
    Abort,
    /// Log the failure, leave the node's subtree out, and keep walking.
    SkipNode,
}

/// Configuration for one report walk.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Directory the walk starts at.
    pub root: IndexPath,

    /// Number of directory levels to report, the root being level one.
    #[builder(default = "1")]
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Index holding the scanned file documents.
    pub index: String,

    /// Index holding scan status records.
    pub status_index: String,

    /// Visiting order for the sequential walker.
    #[builder(default)]
    #[serde(default)]
    pub order: TraversalOrder,

    /// Behavior on per-node query failures.
    #[builder(default)]
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Worker threads for frontier-parallel walking (0 = sequential).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_max_depth() -> u32 {
    1
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if let Some(0) = self.max_depth {
            return Err("Depth must be at least 1".to_string());
        }
        if matches!(self.index, Some(ref index) if index.is_empty()) {
            return Err("Index name cannot be empty".to_string());
        }
        if matches!(self.status_index, Some(ref index) if index.is_empty()) {
            return Err("Status index name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Whether the frontier-parallel walker should be used.
    pub fn is_parallel(&self) -> bool {
        self.threads > 0
    }
}

/// Search backend connection settings, read from a TOML file.
///
/// ```toml
/// es_hosts = ["https://search.example.org:9200"]
/// es_api_key = "..."
/// index = "volume-files"
/// status_index = "volume-scans"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URLs of the backend nodes, tried in order.
    pub es_hosts: Vec<String>,

    /// API key sent with every request.
    #[serde(default)]
    pub es_api_key: Option<String>,

    /// Index holding the scanned file documents.
    pub index: String,

    /// Index holding scan status records.
    pub status_index: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    20
}

impl ConnectionConfig {
    /// Default config location: `<config dir>/scanreport/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scanreport").join("config.toml"))
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ReportError> {
        let config: Self = toml::from_str(contents).map_err(|e| ReportError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot possibly connect.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.es_hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(ReportError::InvalidConfig {
                message: "es_hosts must name at least one host".to_string(),
            });
        }
        if self.index.is_empty() || self.status_index.is_empty() {
            return Err(ReportError::InvalidConfig {
                message: "index and status_index cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
