//! Directory walk and per-node aggregation for scanreport.
//!
//! Starting from a root path, the walker visits every directory less than
//! `max_depth` levels below it. For each one the [`NodeAggregator`] asks the
//! gateway four questions (children, users, filetypes, heat), reconciles
//! the children against the subtree totals, and yields a [`NodeReport`].
//!
//! ```rust,ignore
//! use scanreport_walk::{TreeWalker, WalkConfig};
//!
//! let config = WalkConfig::builder()
//!     .root("/data")
//!     .max_depth(2u32)
//!     .index("files")
//!     .status_index("scans")
//!     .build()?;
//!
//! for report in TreeWalker::start(&gateway, &gateway, &config)? {
//!     let report = report?;
//!     println!("{}: {} bytes", report.path, report.total_size);
//! }
//! ```
//!
//! [`ParallelWalker`] visits the same directories but aggregates each level
//! of the tree concurrently.

mod aggregate;
mod parallel;
mod stats;
mod walker;

pub use aggregate::{Aggregate, Balance, NodeAggregator, reconcile};
pub use parallel::ParallelWalker;
pub use stats::WalkStats;
pub use walker::{TreeWalker, resolve_snapshot};

// Re-export core types for convenience
pub use scanreport_core::{
    FailurePolicy, IndexPath, NodeReport, QueryGateway, ReportError, ScanResolver, ScanSnapshot,
    TraversalOrder, WalkConfig,
};

/// Walk with the walker `config` selects, handing every report to `on_report`.
///
/// Uses [`ParallelWalker`] when `config.threads > 0`, [`TreeWalker`] otherwise.
pub fn run_walk<G, R, F>(
    gateway: &G,
    resolver: &R,
    config: &WalkConfig,
    mut on_report: F,
) -> Result<(ScanSnapshot, WalkStats), ReportError>
where
    G: QueryGateway + Sync + ?Sized,
    R: ScanResolver + ?Sized,
    F: FnMut(NodeReport) -> Result<(), ReportError>,
{
    if config.is_parallel() {
        let mut walker = ParallelWalker::start(gateway, resolver, config)?;
        let stats = walker.run(on_report)?.clone();
        return Ok((walker.snapshot().clone(), stats));
    }

    let mut walker = TreeWalker::start(gateway, resolver, config)?;
    for report in walker.by_ref() {
        on_report(report?)?;
    }
    Ok((walker.snapshot().clone(), walker.stats().clone()))
}
