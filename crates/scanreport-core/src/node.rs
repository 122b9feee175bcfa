//! Per-directory report records.

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::NodeWarning;
use crate::path::IndexPath;
use crate::snapshot::ScanId;

/// Name of the synthetic bucket holding files the index does not surface
/// as individual children.
pub const UNINDEXED_CHILDREN: &str = "__unindexed_children__";

/// Aggregate for one direct child of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildBucket {
    /// Child segment name (not a full path).
    pub path: CompactString,
    /// Number of entries in the child's subtree.
    pub count: u64,
    /// Size in bytes of the child's subtree.
    pub size: u64,
    /// Number of index documents contributing to this bucket.
    pub doc_count: u64,
    /// Mean heat over the child's subtree, rounded.
    pub mean_heat: i64,
}

impl ChildBucket {
    /// Create a bucket for an indexed child.
    pub fn new(
        path: impl Into<CompactString>,
        count: u64,
        size: u64,
        doc_count: u64,
        mean_heat: i64,
    ) -> Self {
        Self {
            path: path.into(),
            count,
            size,
            doc_count,
            mean_heat,
        }
    }

    /// Create the placeholder for the unindexed remainder.
    pub fn unindexed(count: u64, size: u64) -> Self {
        Self::new(UNINDEXED_CHILDREN, count, size, 0, 0)
    }

    /// Whether this is the unindexed-remainder placeholder.
    pub fn is_unindexed(&self) -> bool {
        self.path == UNINDEXED_CHILDREN
    }
}

/// Size and count for one label of a category breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryBucket {
    /// Number of entries.
    pub count: u64,
    /// Size in bytes.
    pub size: u64,
}

impl CategoryBucket {
    /// Create a new category bucket.
    pub fn new(count: u64, size: u64) -> Self {
        Self { count, size }
    }
}

/// Label to bucket mapping for the user, filetype and heat breakdowns.
///
/// Entries with a zero count are never stored. Insertion order is kept so
/// that heat buckets stay in the order the backend defines them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBreakdown(IndexMap<CompactString, CategoryBucket>);

impl CategoryBreakdown {
    /// Create an empty breakdown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a label, merging with an existing entry. Zero counts are ignored.
    pub fn insert(&mut self, label: impl Into<CompactString>, bucket: CategoryBucket) {
        if bucket.count == 0 {
            return;
        }
        let entry = self.0.entry(label.into()).or_default();
        entry.count += bucket.count;
        entry.size += bucket.size;
    }

    /// Look up a label.
    pub fn get(&self, label: &str) -> Option<&CategoryBucket> {
        self.0.get(label)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryBucket)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the breakdown has no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of sizes over all labels.
    pub fn total_size(&self) -> u64 {
        self.0.values().map(|b| b.size).sum()
    }

    /// Sum of counts over all labels.
    pub fn total_count(&self) -> u64 {
        self.0.values().map(|b| b.count).sum()
    }
}

impl<L: Into<CompactString>> FromIterator<(L, CategoryBucket)> for CategoryBreakdown {
    fn from_iter<I: IntoIterator<Item = (L, CategoryBucket)>>(iter: I) -> Self {
        let mut breakdown = Self::new();
        for (label, bucket) in iter {
            breakdown.insert(label, bucket);
        }
        breakdown
    }
}

/// Everything reported about one visited directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    /// Directory path.
    pub path: IndexPath,
    /// Size in bytes of the whole subtree.
    pub total_size: u64,
    /// Entry count of the whole subtree, including the directory itself.
    pub total_count: u64,
    /// Direct children, plus at most one unindexed-remainder bucket last.
    pub children: Vec<ChildBucket>,
    /// Usage by user.
    pub users: CategoryBreakdown,
    /// Usage by file extension.
    pub filetypes: CategoryBreakdown,
    /// Usage by heat bucket.
    pub heat: CategoryBreakdown,
    /// Scan the figures were read from.
    pub scan_id: ScanId,
    /// Problems found while assembling this report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NodeWarning>,
}

impl NodeReport {
    /// Sum of child sizes, placeholder included.
    pub fn child_size_sum(&self) -> u64 {
        self.children.iter().map(|c| c.size).sum()
    }

    /// Sum of child counts, placeholder included.
    pub fn child_count_sum(&self) -> u64 {
        self.children.iter().map(|c| c.count).sum()
    }

    /// The unindexed-remainder bucket, if one was synthesized.
    pub fn unindexed(&self) -> Option<&ChildBucket> {
        self.children.iter().find(|c| c.is_unindexed())
    }

    /// Children that name real subdirectories or files.
    pub fn indexed_children(&self) -> impl Iterator<Item = &ChildBucket> {
        self.children.iter().filter(|c| !c.is_unindexed())
    }

    /// Paths of the children a walk should descend into.
    pub fn child_paths(&self) -> impl Iterator<Item = IndexPath> + '_ {
        self.indexed_children().map(|c| self.path.join(&c.path))
    }

    /// Check if there were any warnings for this node.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
