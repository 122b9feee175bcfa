//! Error and warning types for report generation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::path::IndexPath;

/// The fixed questions the gateway can be asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum QueryKind {
    /// Immediate children plus subtree totals.
    Children,
    /// Usage by owning user.
    Users,
    /// Usage by file extension.
    Filetypes,
    /// Usage by last-access heat bucket.
    Heat,
    /// Latest completed scan lookup.
    LatestScan,
}

/// Failures reported by a query backend.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request never produced a response.
    #[error("Transport error talking to {host}: {message}")]
    Transport { host: String, message: String },

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The response body could not be decoded.
    #[error("Could not decode backend response: {message}")]
    Decode { message: String },

    /// No backend hosts are configured.
    #[error("No backend hosts configured")]
    NoHosts,
}

/// Errors that abort (or, by policy, skip) part of a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No completed scan covers the requested root.
    #[error("No scan found for {path} in status index {status_index}")]
    NoScanFound {
        path: IndexPath,
        status_index: String,
    },

    /// A gateway query failed for a node.
    #[error("{query} query failed for {path}: {source}")]
    QueryFailure {
        path: IndexPath,
        query: QueryKind,
        #[source]
        source: QueryError,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// File I/O error with path context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing report output failed.
    #[error("Failed to write report output: {0}")]
    Output(#[from] std::io::Error),

    /// An emitter could not serialize a report.
    #[error("Failed to emit report: {message}")]
    Emit { message: String },
}

impl ReportError {
    /// Wrap a gateway failure with the node and query it happened on.
    pub fn query(path: &IndexPath, query: QueryKind, source: QueryError) -> Self {
        Self::QueryFailure {
            path: path.clone(),
            query,
            source,
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error may be skipped under [`crate::FailurePolicy::SkipNode`].
    pub fn is_node_local(&self) -> bool {
        matches!(self, Self::QueryFailure { .. })
    }
}

/// Kind of node warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum WarningKind {
    /// A breakdown bucket was missing a required field and was dropped.
    MalformedBucket,
    /// The children query returned no subtree totals.
    MissingTotals,
}

/// Non-fatal problem found while assembling one node's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeWarning {
    /// Node the warning belongs to.
    pub path: IndexPath,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl NodeWarning {
    /// Create a new node warning.
    pub fn new(path: IndexPath, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
        }
    }

    /// A bucket of the given breakdown lacked `field`.
    pub fn malformed_bucket(path: &IndexPath, query: QueryKind, field: &str) -> Self {
        Self {
            path: path.clone(),
            message: format!("{query} bucket missing `{field}`, dropped"),
            kind: WarningKind::MalformedBucket,
        }
    }

    /// A children bucket key was not a single path segment.
    pub fn invalid_child_key(path: &IndexPath, key: &str) -> Self {
        Self {
            path: path.clone(),
            message: format!("children bucket key {key:?} is not a single path segment, dropped"),
            kind: WarningKind::MalformedBucket,
        }
    }

    /// The children response carried no subtree totals.
    pub fn missing_totals(path: &IndexPath) -> Self {
        Self {
            path: path.clone(),
            message: "subtree totals missing, using sum of children".to_string(),
            kind: WarningKind::MissingTotals,
        }
    }
}
