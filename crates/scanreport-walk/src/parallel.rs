//! Frontier-parallel walk.
//!
//! Directories on one level of the walk are independent, read-only queries,
//! so a whole level is aggregated at once on a rayon pool. Reports are then
//! handed out in frontier order (parent order, then child-bucket order),
//! which is the order a FIFO sequential walk produces.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use scanreport_core::{
    FailurePolicy, IndexPath, NodeReport, QueryGateway, ReportError, ScanResolver, ScanSnapshot,
    WalkConfig,
};
use tracing::{debug, info, warn};

use crate::aggregate::NodeAggregator;
use crate::stats::WalkStats;
use crate::walker::{next_level, resolve_snapshot, within_depth};

/// Walker aggregating each level of the tree concurrently.
pub struct ParallelWalker<'a, G: ?Sized> {
    aggregator: NodeAggregator<'a, G>,
    snapshot: ScanSnapshot,
    config: &'a WalkConfig,
    pool: ThreadPool,
    stats: WalkStats,
}

impl<'a, G: QueryGateway + Sync + ?Sized> ParallelWalker<'a, G> {
    /// Resolve the scan for `config.root` and prepare the walk.
    pub fn start<R: ScanResolver + ?Sized>(
        gateway: &'a G,
        resolver: &R,
        config: &'a WalkConfig,
    ) -> Result<Self, ReportError> {
        let snapshot = resolve_snapshot(resolver, config)?;
        Self::with_snapshot(gateway, snapshot, config)
    }

    /// Prepare a walk over an already resolved snapshot.
    pub fn with_snapshot(
        gateway: &'a G,
        snapshot: ScanSnapshot,
        config: &'a WalkConfig,
    ) -> Result<Self, ReportError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .thread_name(|i| format!("scanreport-walk-{i}"))
            .build()
            .map_err(|e| ReportError::InvalidConfig {
                message: format!("cannot start worker pool: {e}"),
            })?;

        Ok(Self {
            aggregator: NodeAggregator::new(gateway, &config.index),
            snapshot,
            config,
            pool,
            stats: WalkStats::new(),
        })
    }

    /// The snapshot every query is scoped to.
    pub fn snapshot(&self) -> &ScanSnapshot {
        &self.snapshot
    }

    /// Counters so far.
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Walk the tree, passing each report to `on_report` in frontier order.
    ///
    /// Under [`FailurePolicy::Abort`] the first failure in frontier order is
    /// returned after every report before it on the same level was delivered.
    pub fn run<F>(&mut self, mut on_report: F) -> Result<&WalkStats, ReportError>
    where
        F: FnMut(NodeReport) -> Result<(), ReportError>,
    {
        let base_depth = self.config.root.segment_count();
        let max_depth = self.config.max_depth as usize;
        let mut frontier = vec![self.config.root.clone()];

        while !frontier.is_empty() {
            let (level, skipped): (Vec<IndexPath>, Vec<IndexPath>) = frontier
                .into_iter()
                .partition(|p| within_depth(p, base_depth, max_depth));
            for _ in &skipped {
                self.stats.record_skipped();
            }
            debug!(nodes = level.len(), "aggregating frontier");

            let aggregator = &self.aggregator;
            let scan_id = &self.snapshot.scan_id;
            let results: Vec<_> = self.pool.install(|| {
                level
                    .par_iter()
                    .map(|path| aggregator.aggregate_node(path, scan_id))
                    .collect()
            });

            let mut next = Vec::new();
            for (path, result) in level.iter().zip(results) {
                match result {
                    Ok(aggregate) => {
                        self.stats.record_report(&aggregate);
                        next.extend(next_level(&aggregate.report));
                        on_report(aggregate.report)?;
                    }
                    Err(err)
                        if err.is_node_local()
                            && self.config.failure_policy == FailurePolicy::SkipNode =>
                    {
                        warn!(path = %path, error = %err, "skipping node");
                        self.stats.record_failure();
                    }
                    Err(err) => return Err(err),
                }
            }
            frontier = next;
        }

        info!(
            reported = self.stats.nodes_reported,
            failed = self.stats.nodes_failed,
            "walk complete"
        );
        Ok(&self.stats)
    }
}
