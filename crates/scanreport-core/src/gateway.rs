//! Backend seams: the aggregate query gateway and the scan resolver.
//!
//! Responses are returned in a raw form where every field the backend might
//! omit is an `Option`. Turning them into [`crate::NodeReport`] buckets, and
//! deciding what a missing field means, is left to the aggregator.

use compact_str::CompactString;

use crate::error::QueryError;
use crate::path::IndexPath;
use crate::snapshot::{ScanId, ScanSnapshot};

/// One child bucket as the backend returned it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawChildBucket {
    /// Child segment name.
    pub key: Option<CompactString>,
    /// Entry count of the child subtree.
    pub count: Option<u64>,
    /// Size of the child subtree.
    pub size: Option<u64>,
    /// Contributing document count.
    pub doc_count: Option<u64>,
    /// Mean heat (unrounded); absent when the subtree has no heat values.
    pub mean_heat: Option<f64>,
}

impl RawChildBucket {
    /// A fully populated bucket.
    pub fn complete(key: &str, count: u64, size: u64, doc_count: u64, mean_heat: f64) -> Self {
        Self {
            key: Some(key.into()),
            count: Some(count),
            size: Some(size),
            doc_count: Some(doc_count),
            mean_heat: Some(mean_heat),
        }
    }
}

/// Answer to the children question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildrenResponse {
    /// One bucket per direct child the index surfaces.
    pub buckets: Vec<RawChildBucket>,
    /// Size of the whole subtree.
    pub total_size: Option<u64>,
    /// Entry count of the whole subtree, the directory's own entry included.
    pub total_count: Option<u64>,
}

/// One category bucket as the backend returned it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCategoryBucket {
    /// User name, extension or heat key.
    pub label: Option<CompactString>,
    /// Entry count.
    pub count: Option<u64>,
    /// Size in bytes.
    pub size: Option<u64>,
}

impl RawCategoryBucket {
    /// A fully populated bucket.
    pub fn complete(label: &str, count: u64, size: u64) -> Self {
        Self {
            label: Some(label.into()),
            count: Some(count),
            size: Some(size),
        }
    }
}

/// Answer to a user, filetype or heat question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryResponse {
    /// Buckets in backend order.
    pub buckets: Vec<RawCategoryBucket>,
}

/// Read-only aggregate questions about one path in one scan.
pub trait QueryGateway {
    /// Direct children of `path` with subtree totals.
    fn children_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<ChildrenResponse, QueryError>;

    /// Subtree usage per user.
    fn user_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError>;

    /// Subtree usage per file extension.
    fn filetype_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError>;

    /// Subtree usage per heat bucket.
    fn heat_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError>;
}

/// Finds the scan a report should be read from.
pub trait ScanResolver {
    /// Most recent completed scan covering `path`, or `None`.
    fn latest_scan(
        &self,
        path: &IndexPath,
        status_index: &str,
    ) -> Result<Option<ScanSnapshot>, QueryError>;
}

impl<G: QueryGateway + ?Sized> QueryGateway for &G {
    fn children_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<ChildrenResponse, QueryError> {
        (**self).children_breakdown(path, index, scan_id)
    }

    fn user_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError> {
        (**self).user_breakdown(path, index, scan_id)
    }

    fn filetype_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError> {
        (**self).filetype_breakdown(path, index, scan_id)
    }

    fn heat_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError> {
        (**self).heat_breakdown(path, index, scan_id)
    }
}

impl<R: ScanResolver + ?Sized> ScanResolver for &R {
    fn latest_scan(
        &self,
        path: &IndexPath,
        status_index: &str,
    ) -> Result<Option<ScanSnapshot>, QueryError> {
        (**self).latest_scan(path, status_index)
    }
}
