//! Core types and traits for scanreport.
//!
//! This crate provides the data model shared by the rest of the workspace:
//! index paths, scan snapshots, the per-directory [`NodeReport`] and its
//! buckets, the error taxonomy, configuration, and the [`QueryGateway`] /
//! [`ScanResolver`] traits that put the search backend behind a seam.

mod config;
mod error;
mod gateway;
mod node;
mod path;
mod snapshot;

pub use config::{
    ConnectionConfig, FailurePolicy, TraversalOrder, WalkConfig, WalkConfigBuilder,
};
pub use error::{NodeWarning, QueryError, QueryKind, ReportError, WarningKind};
pub use gateway::{
    CategoryResponse, ChildrenResponse, QueryGateway, RawCategoryBucket, RawChildBucket,
    ScanResolver,
};
pub use node::{CategoryBreakdown, CategoryBucket, ChildBucket, NodeReport, UNINDEXED_CHILDREN};
pub use path::IndexPath;
pub use snapshot::{ScanId, ScanSnapshot};
