//! Walk statistics.

use serde::Serialize;

use crate::aggregate::Aggregate;

/// Counters collected over one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Nodes aggregated and handed to the caller.
    pub nodes_reported: u64,
    /// Queued nodes dropped for lying at or below the depth limit.
    pub nodes_skipped: u64,
    /// Nodes whose queries failed under the skip policy.
    pub nodes_failed: u64,
    /// Unindexed-remainder buckets synthesized.
    pub unindexed_buckets: u64,
    /// Nodes whose totals disagreed with their children beyond repair.
    pub negative_balances: u64,
    /// Node warnings attached to reports.
    pub warnings: u64,
}

impl WalkStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully aggregated node.
    pub fn record_report(&mut self, aggregate: &Aggregate) {
        self.nodes_reported += 1;
        self.warnings += aggregate.report.warnings.len() as u64;
        if aggregate.report.unindexed().is_some() {
            self.unindexed_buckets += 1;
        }
        if aggregate.balance.is_drift() {
            self.negative_balances += 1;
        }
    }

    /// Record a node dropped by the depth limit.
    pub fn record_skipped(&mut self) {
        self.nodes_skipped += 1;
    }

    /// Record a node dropped after a query failure.
    pub fn record_failure(&mut self) {
        self.nodes_failed += 1;
    }
}
