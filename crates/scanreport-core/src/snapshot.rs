//! Scan snapshot identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::path::IndexPath;

/// Opaque identifier of one indexing pass over a volume.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(pub CompactString);

impl ScanId {
    /// Create a new scan id.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The completed scan a report is read from.
///
/// Resolved once per invocation for the root path and reused for every
/// descendant query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    /// Scan identifier every aggregate query is scoped to.
    pub scan_id: ScanId,
    /// Root path the scan covered.
    pub path: IndexPath,
    /// Status index the snapshot was read from.
    pub status_index: String,
    /// When the scan finished, if the status record carries it.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScanSnapshot {
    /// Create a snapshot without a completion time.
    pub fn new(
        scan_id: impl Into<CompactString>,
        path: impl Into<IndexPath>,
        status_index: impl Into<String>,
    ) -> Self {
        Self {
            scan_id: ScanId::new(scan_id),
            path: path.into(),
            status_index: status_index.into(),
            completed_at: None,
        }
    }

    /// Attach a completion time.
    pub fn with_completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }
}
