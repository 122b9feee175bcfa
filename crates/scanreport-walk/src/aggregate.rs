//! Per-node aggregation and balance reconciliation.
//!
//! The index only surfaces children that have documents of their own. Files
//! sitting directly in a directory, or children past the backend's bucket
//! limit, show up in the subtree totals but in no child bucket. Reconciling
//! the two adds one placeholder bucket so the children always account for
//! everything below the directory.

use scanreport_core::{
    CategoryBreakdown, CategoryBucket, CategoryResponse, ChildBucket, IndexPath, NodeReport,
    NodeWarning, QueryError, QueryGateway, QueryKind, RawChildBucket, ReportError, ScanId,
};
use tracing::{debug, warn};

/// Gap between subtree totals and the sum over surfaced children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    /// `total_size - Σ child.size`.
    pub size: i128,
    /// `(total_count - 1) - Σ child.count`; the `- 1` is the directory's own entry.
    pub count: i128,
}

impl Balance {
    /// Compute the gap for a node.
    pub fn compute(total_size: u64, total_count: u64, children: &[ChildBucket]) -> Self {
        let child_size: i128 = children.iter().map(|c| i128::from(c.size)).sum();
        let child_count: i128 = children.iter().map(|c| i128::from(c.count)).sum();

        Self {
            size: i128::from(total_size) - child_size,
            count: i128::from(total_count) - 1 - child_count,
        }
    }

    /// The placeholder bucket closing this gap, if the count gap is positive.
    ///
    /// A negative size gap is clamped to zero.
    pub fn placeholder(&self) -> Option<ChildBucket> {
        if self.count <= 0 {
            return None;
        }
        let count = u64::try_from(self.count).unwrap_or(u64::MAX);
        let size = u64::try_from(self.size.max(0)).unwrap_or(u64::MAX);
        Some(ChildBucket::unindexed(count, size))
    }

    /// Whether the totals disagree with the children in a way no placeholder
    /// can express. This points at drift between the index and the scan.
    pub fn is_drift(&self) -> bool {
        self.count < 0 || (self.count == 0 && self.size != 0) || (self.count > 0 && self.size < 0)
    }
}

/// Append the unindexed-remainder bucket when the count gap is positive.
///
/// Returns the gap as measured before anything was appended.
pub fn reconcile(children: &mut Vec<ChildBucket>, total_size: u64, total_count: u64) -> Balance {
    let balance = Balance::compute(total_size, total_count, children);
    if let Some(placeholder) = balance.placeholder() {
        children.push(placeholder);
    }
    balance
}

/// A node report together with the gap its reconciliation saw.
#[derive(Debug, Clone)]
pub struct Aggregate {
    /// The assembled report.
    pub report: NodeReport,
    /// Pre-reconciliation balance.
    pub balance: Balance,
}

/// Builds one [`NodeReport`] from four gateway queries.
pub struct NodeAggregator<'a, G: ?Sized> {
    gateway: &'a G,
    index: &'a str,
}

impl<'a, G: QueryGateway + ?Sized> NodeAggregator<'a, G> {
    /// Create an aggregator querying `index` through `gateway`.
    pub fn new(gateway: &'a G, index: &'a str) -> Self {
        Self { gateway, index }
    }

    /// Build the report for `path` in scan `scan_id`.
    pub fn aggregate(&self, path: &IndexPath, scan_id: &ScanId) -> Result<NodeReport, ReportError> {
        self.aggregate_node(path, scan_id).map(|a| a.report)
    }

    /// Build the report and keep the reconciliation balance.
    pub fn aggregate_node(
        &self,
        path: &IndexPath,
        scan_id: &ScanId,
    ) -> Result<Aggregate, ReportError> {
        debug!(path = %path, scan_id = %scan_id, "aggregating node");
        let mut warnings = Vec::new();

        let response = self
            .gateway
            .children_breakdown(path, self.index, scan_id)
            .map_err(|e| ReportError::query(path, QueryKind::Children, e))?;

        let mut children = Vec::with_capacity(response.buckets.len() + 1);
        for raw in response.buckets {
            match child_bucket(path, raw) {
                Ok(bucket) => children.push(bucket),
                Err(warning) => warnings.push(warning),
            }
        }

        if response.total_size.is_none() || response.total_count.is_none() {
            warnings.push(NodeWarning::missing_totals(path));
        }
        let total_size = response
            .total_size
            .unwrap_or_else(|| children.iter().map(|c| c.size).sum());
        let total_count = response
            .total_count
            .unwrap_or_else(|| children.iter().map(|c| c.count).sum::<u64>() + 1);

        let balance = reconcile(&mut children, total_size, total_count);
        if balance.is_drift() {
            debug!(
                path = %path,
                size_gap = %balance.size,
                count_gap = %balance.count,
                "subtree totals disagree with children"
            );
        }

        let users = category_breakdown(
            path,
            QueryKind::Users,
            self.gateway.user_breakdown(path, self.index, scan_id),
            &mut warnings,
        )?;
        let filetypes = category_breakdown(
            path,
            QueryKind::Filetypes,
            self.gateway.filetype_breakdown(path, self.index, scan_id),
            &mut warnings,
        )?;
        let heat = category_breakdown(
            path,
            QueryKind::Heat,
            self.gateway.heat_breakdown(path, self.index, scan_id),
            &mut warnings,
        )?;

        for warning in &warnings {
            warn!(path = %warning.path, kind = %warning.kind, "{}", warning.message);
        }

        Ok(Aggregate {
            report: NodeReport {
                path: path.clone(),
                total_size,
                total_count,
                children,
                users,
                filetypes,
                heat,
                scan_id: scan_id.clone(),
                warnings,
            },
            balance,
        })
    }
}

/// Validate a raw child bucket.
///
/// The key must name exactly one path segment below `path`; anything else
/// would join back onto `path` itself or skip a level.
fn child_bucket(path: &IndexPath, raw: RawChildBucket) -> Result<ChildBucket, NodeWarning> {
    let missing = |field| NodeWarning::malformed_bucket(path, QueryKind::Children, field);

    let key = raw.key.ok_or_else(|| missing("key"))?;
    if !is_segment(&key) {
        return Err(NodeWarning::invalid_child_key(path, &key));
    }
    Ok(ChildBucket::new(
        key,
        raw.count.ok_or_else(|| missing("count"))?,
        raw.size.ok_or_else(|| missing("size"))?,
        raw.doc_count.ok_or_else(|| missing("doc_count"))?,
        raw.mean_heat.map(round_heat).unwrap_or(0),
    ))
}

fn is_segment(key: &str) -> bool {
    !key.is_empty() && !key.contains('/') && key != "." && key != ".."
}

fn round_heat(heat: f64) -> i64 {
    if heat.is_finite() { heat.round() as i64 } else { 0 }
}

fn category_breakdown(
    path: &IndexPath,
    query: QueryKind,
    response: Result<CategoryResponse, QueryError>,
    warnings: &mut Vec<NodeWarning>,
) -> Result<CategoryBreakdown, ReportError> {
    let response = response.map_err(|e| ReportError::query(path, query, e))?;

    let mut breakdown = CategoryBreakdown::new();
    for raw in response.buckets {
        let field = match (&raw.label, raw.count, raw.size) {
            (Some(label), Some(count), Some(size)) => {
                breakdown.insert(label.clone(), CategoryBucket::new(count, size));
                continue;
            }
            (None, _, _) => "key",
            (_, None, _) => "count",
            _ => "size",
        };
        warnings.push(NodeWarning::malformed_bucket(path, query, field));
    }
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use scanreport_core::{ChildrenResponse, RawCategoryBucket, UNINDEXED_CHILDREN, WarningKind};

    use super::*;

    struct Canned {
        children: ChildrenResponse,
        users: CategoryResponse,
        calls: Cell<usize>,
        fail_heat: bool,
    }

    impl Canned {
        fn new(children: ChildrenResponse) -> Self {
            Self {
                children,
                users: CategoryResponse::default(),
                calls: Cell::new(0),
                fail_heat: false,
            }
        }

        fn bump(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    impl QueryGateway for Canned {
        fn children_breakdown(
            &self,
            _path: &IndexPath,
            _index: &str,
            _scan_id: &ScanId,
        ) -> Result<ChildrenResponse, QueryError> {
            self.bump();
            Ok(self.children.clone())
        }

        fn user_breakdown(
            &self,
            _path: &IndexPath,
            _index: &str,
            _scan_id: &ScanId,
        ) -> Result<CategoryResponse, QueryError> {
            self.bump();
            Ok(self.users.clone())
        }

        fn filetype_breakdown(
            &self,
            _path: &IndexPath,
            _index: &str,
            _scan_id: &ScanId,
        ) -> Result<CategoryResponse, QueryError> {
            self.bump();
            Ok(CategoryResponse::default())
        }

        fn heat_breakdown(
            &self,
            _path: &IndexPath,
            _index: &str,
            _scan_id: &ScanId,
        ) -> Result<CategoryResponse, QueryError> {
            self.bump();
            if self.fail_heat {
                return Err(QueryError::Status {
                    code: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(CategoryResponse::default())
        }
    }

    fn data_children(total_count: u64) -> ChildrenResponse {
        ChildrenResponse {
            buckets: vec![
                RawChildBucket::complete("x", 5, 400, 5, 2.4),
                RawChildBucket::complete("y", 5, 500, 5, 2.6),
            ],
            total_size: Some(1000),
            total_count: Some(total_count),
        }
    }

    fn run(gateway: &Canned) -> Aggregate {
        NodeAggregator::new(gateway, "files")
            .aggregate_node(&IndexPath::new("/data"), &ScanId::new("s1"))
            .unwrap()
    }

    #[test]
    fn test_zero_count_gap_adds_nothing() {
        let gateway = Canned::new(data_children(11));
        let aggregate = run(&gateway);

        assert_eq!(aggregate.balance, Balance { size: 100, count: 0 });
        assert!(aggregate.balance.is_drift());
        assert_eq!(aggregate.report.children.len(), 2);
        assert!(aggregate.report.unindexed().is_none());
    }

    #[test]
    fn test_positive_gap_adds_placeholder() {
        let gateway = Canned::new(data_children(12));
        let report = run(&gateway).report;

        let placeholder = report.children.last().unwrap();
        assert_eq!(placeholder.path, UNINDEXED_CHILDREN);
        assert_eq!(placeholder.size, 100);
        assert_eq!(placeholder.count, 1);
        assert_eq!(report.child_count_sum(), report.total_count - 1);
        assert_eq!(report.child_size_sum(), report.total_size);
    }

    #[test]
    fn test_negative_gap_is_noop() {
        let gateway = Canned::new(data_children(5));
        let aggregate = run(&gateway);

        assert!(aggregate.balance.count < 0);
        assert!(aggregate.report.unindexed().is_none());
        assert!(aggregate.report.warnings.is_empty());
    }

    #[test]
    fn test_placeholder_size_never_negative() {
        let balance = Balance::compute(100, 12, &[ChildBucket::new("x", 10, 400, 10, 0)]);
        let placeholder = balance.placeholder().unwrap();
        assert_eq!(placeholder.count, 1);
        assert_eq!(placeholder.size, 0);
        assert!(balance.is_drift());
    }

    #[test]
    fn test_mean_heat_rounded() {
        let gateway = Canned::new(data_children(11));
        let report = run(&gateway).report;
        assert_eq!(report.children[0].mean_heat, 2);
        assert_eq!(report.children[1].mean_heat, 3);
    }

    #[test]
    fn test_exactly_four_queries() {
        let gateway = Canned::new(data_children(12));
        run(&gateway);
        assert_eq!(gateway.calls.get(), 4);
    }

    #[test]
    fn test_zero_count_categories_dropped() {
        let mut gateway = Canned::new(data_children(11));
        gateway.users = CategoryResponse {
            buckets: vec![
                RawCategoryBucket::complete("alice", 7, 700),
                RawCategoryBucket::complete("ghost", 0, 0),
            ],
        };
        let report = run(&gateway).report;
        assert_eq!(report.users.len(), 1);
        assert!(report.users.iter().all(|(_, b)| b.count > 0));
    }

    #[test]
    fn test_malformed_buckets_become_warnings() {
        let mut children = data_children(11);
        children.buckets.push(RawChildBucket {
            key: Some("z".into()),
            count: None,
            ..Default::default()
        });
        let mut gateway = Canned::new(children);
        gateway.users = CategoryResponse {
            buckets: vec![RawCategoryBucket {
                label: Some("bob".into()),
                count: Some(2),
                size: None,
            }],
        };

        let report = run(&gateway).report;
        assert_eq!(report.indexed_children().count(), 2);
        assert!(report.users.is_empty());
        assert_eq!(report.warnings.len(), 2);
        assert!(report
            .warnings
            .iter()
            .all(|w| w.kind == WarningKind::MalformedBucket));
        assert!(report.warnings[0].message.contains("`count`"));
        assert!(report.warnings[1].message.contains("`size`"));
    }

    #[test]
    fn test_child_keys_must_be_one_segment() {
        let mut children = data_children(11);
        for key in ["", "/", "a/b", ".."] {
            children
                .buckets
                .push(RawChildBucket::complete(key, 1, 10, 1, 0.0));
        }
        let gateway = Canned::new(children);
        let report = run(&gateway).report;

        let names: Vec<&str> = report.indexed_children().map(|c| c.path.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(report.warnings.len(), 4);
        assert!(report
            .warnings
            .iter()
            .all(|w| w.kind == WarningKind::MalformedBucket));
        assert!(report.warnings[2].message.contains("\"a/b\""));
    }

    #[test]
    fn test_missing_totals_fall_back_to_children() {
        let mut children = data_children(11);
        children.total_size = None;
        children.total_count = None;
        let gateway = Canned::new(children);
        let aggregate = run(&gateway);

        assert_eq!(aggregate.report.total_size, 900);
        assert_eq!(aggregate.report.total_count, 11);
        assert_eq!(aggregate.balance, Balance { size: 0, count: 0 });
        assert_eq!(aggregate.report.warnings[0].kind, WarningKind::MissingTotals);
    }

    #[test]
    fn test_query_failure_propagates() {
        let mut gateway = Canned::new(data_children(11));
        gateway.fail_heat = true;
        let err = NodeAggregator::new(&gateway, "files")
            .aggregate(&IndexPath::new("/data"), &ScanId::new("s1"))
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::QueryFailure {
                query: QueryKind::Heat,
                ..
            }
        ));
    }
}
