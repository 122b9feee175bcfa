//! Depth-bounded walk over the indexed directory tree.

use std::collections::VecDeque;

use scanreport_core::{
    FailurePolicy, IndexPath, NodeReport, QueryGateway, QueryKind, ReportError, ScanResolver,
    ScanSnapshot, TraversalOrder, WalkConfig,
};
use tracing::{info, warn};

use crate::aggregate::{Aggregate, NodeAggregator};
use crate::stats::WalkStats;

/// Look up the scan covering the walk root.
///
/// Fails with [`ReportError::NoScanFound`] when none exists. The returned
/// snapshot is reused for every node of the walk.
pub fn resolve_snapshot<R: ScanResolver + ?Sized>(
    resolver: &R,
    config: &WalkConfig,
) -> Result<ScanSnapshot, ReportError> {
    let snapshot = resolver
        .latest_scan(&config.root, &config.status_index)
        .map_err(|e| ReportError::query(&config.root, QueryKind::LatestScan, e))?
        .ok_or_else(|| ReportError::NoScanFound {
            path: config.root.clone(),
            status_index: config.status_index.clone(),
        })?;

    info!(
        root = %config.root,
        scan_id = %snapshot.scan_id,
        scan_root = %snapshot.path,
        "resolved scan"
    );
    Ok(snapshot)
}

/// Whether a path lies inside the reported levels below `base_depth`.
pub(crate) fn within_depth(path: &IndexPath, base_depth: usize, max_depth: usize) -> bool {
    path.segment_count().saturating_sub(base_depth) < max_depth
}

/// Child paths exactly one level below the report's node.
///
/// Any other path is dropped with a warning so a bad bucket key can never
/// requeue the node itself.
pub(crate) fn next_level(report: &NodeReport) -> impl Iterator<Item = IndexPath> + '_ {
    let depth = report.path.segment_count() + 1;
    report.child_paths().filter(move |child| {
        let one_down = child.segment_count() == depth;
        if !one_down {
            warn!(parent = %report.path, child = %child, "child is not one level down, not walked");
        }
        one_down
    })
}

/// Sequential walker yielding one [`NodeReport`] per visited directory.
///
/// Reports are produced lazily: each call to `next` pops queued paths until
/// one lies within the depth limit, aggregates it, and queues its children.
/// Depth is measured from path segments, so the visited set does not depend
/// on [`TraversalOrder`].
pub struct TreeWalker<'a, G: ?Sized> {
    aggregator: NodeAggregator<'a, G>,
    snapshot: ScanSnapshot,
    queue: VecDeque<IndexPath>,
    base_depth: usize,
    max_depth: usize,
    order: TraversalOrder,
    failure_policy: FailurePolicy,
    stats: WalkStats,
    finished: bool,
}

impl<'a, G: QueryGateway + ?Sized> TreeWalker<'a, G> {
    /// Resolve the scan for `config.root` and prepare the walk.
    pub fn start<R: ScanResolver + ?Sized>(
        gateway: &'a G,
        resolver: &R,
        config: &'a WalkConfig,
    ) -> Result<Self, ReportError> {
        let snapshot = resolve_snapshot(resolver, config)?;
        Ok(Self::with_snapshot(gateway, snapshot, config))
    }

    /// Prepare a walk over an already resolved snapshot.
    pub fn with_snapshot(gateway: &'a G, snapshot: ScanSnapshot, config: &'a WalkConfig) -> Self {
        Self {
            aggregator: NodeAggregator::new(gateway, &config.index),
            snapshot,
            queue: VecDeque::from([config.root.clone()]),
            base_depth: config.root.segment_count(),
            max_depth: config.max_depth as usize,
            order: config.order,
            failure_policy: config.failure_policy,
            stats: WalkStats::new(),
            finished: false,
        }
    }

    /// The snapshot every query is scoped to.
    pub fn snapshot(&self) -> &ScanSnapshot {
        &self.snapshot
    }

    /// Counters so far.
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    fn pop(&mut self) -> Option<IndexPath> {
        match self.order {
            TraversalOrder::Lifo => self.queue.pop_back(),
            TraversalOrder::Fifo => self.queue.pop_front(),
        }
    }

    fn accept(&mut self, aggregate: Aggregate) -> NodeReport {
        self.stats.record_report(&aggregate);
        self.queue.extend(next_level(&aggregate.report));
        aggregate.report
    }
}

impl<G: QueryGateway + ?Sized> Iterator for TreeWalker<'_, G> {
    type Item = Result<NodeReport, ReportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some(path) = self.pop() {
            if !within_depth(&path, self.base_depth, self.max_depth) {
                self.stats.record_skipped();
                continue;
            }

            match self.aggregator.aggregate_node(&path, &self.snapshot.scan_id) {
                Ok(aggregate) => return Some(Ok(self.accept(aggregate))),
                Err(err) if err.is_node_local() && self.failure_policy == FailurePolicy::SkipNode => {
                    warn!(path = %path, error = %err, "skipping node");
                    self.stats.record_failure();
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }

        info!(
            reported = self.stats.nodes_reported,
            failed = self.stats.nodes_failed,
            "walk complete"
        );
        self.finished = true;
        None
    }
}
