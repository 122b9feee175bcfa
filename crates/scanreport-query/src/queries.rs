//! Request bodies for the fixed aggregate questions.

use serde_json::{Value, json};

use scanreport_core::{IndexPath, ScanId};

/// Upper bound on buckets per terms aggregation. Children past this limit
/// fall into the unindexed remainder.
pub const MAX_BUCKETS: usize = 10_000;

/// Field names of the scanner's documents.
pub mod fields {
    pub const PATH: &str = "path";
    pub const SCAN_ID: &str = "scan_id";
    pub const SIZE: &str = "size";
    pub const USER: &str = "user";
    pub const EXTENSION: &str = "extension";
    pub const HEAT: &str = "heat";
    pub const KIND: &str = "type";
    pub const STATUS: &str = "status";
    pub const END_TIME: &str = "end_time";
}

/// `type` value of a directory document.
pub const DIRECTORY: &str = "directory";

/// Status value of a finished scan.
pub const COMPLETED: &str = "completed";

/// One heat bucket: entries last accessed between `from` and `to` days ago.
#[derive(Debug, Clone, Copy)]
pub struct HeatRange {
    pub key: &'static str,
    pub from: Option<f64>,
    pub to: Option<f64>,
}

/// Heat buckets, hottest first.
pub const HEAT_RANGES: [HeatRange; 5] = [
    HeatRange { key: "0-7d", from: None, to: Some(7.0) },
    HeatRange { key: "7-30d", from: Some(7.0), to: Some(30.0) },
    HeatRange { key: "30-90d", from: Some(30.0), to: Some(90.0) },
    HeatRange { key: "90-365d", from: Some(90.0), to: Some(365.0) },
    HeatRange { key: "365d+", from: Some(365.0), to: None },
];

// Segment of a descendant's path directly below `params.prefix`. A document
// directly below the prefix only names a child when it is a directory; loose
// files get no key and land in the unindexed remainder.
const CHILD_SEGMENT_SCRIPT: &str = "String p = doc[params.field].value; \
     String rest = p.substring(params.prefix.length()); \
     int slash = rest.indexOf('/'); \
     if (slash >= 0) { return rest.substring(0, slash); } \
     if (doc.containsKey(params.kind_field) && doc[params.kind_field].size() > 0 \
         && doc[params.kind_field].value == params.directory) { return rest; } \
     return null;";

/// Documents of `scan_id` at or below `path`.
pub fn subtree_filter(path: &IndexPath, scan_id: &ScanId) -> Value {
    json!({
        "bool": {
            "filter": [
                { "term": { fields::SCAN_ID: scan_id.as_str() } },
                {
                    "bool": {
                        "should": [
                            { "term": { fields::PATH: path.as_str() } },
                            { "prefix": { fields::PATH: path.descendant_prefix() } }
                        ],
                        "minimum_should_match": 1
                    }
                }
            ]
        }
    })
}

/// Subtree totals plus one bucket per direct child.
pub fn children_query(path: &IndexPath, scan_id: &ScanId) -> Value {
    json!({
        "size": 0,
        "query": subtree_filter(path, scan_id),
        "aggs": {
            "size": { "sum": { "field": fields::SIZE } },
            "count": { "value_count": { "field": fields::PATH } },
            "children": {
                "filter": {
                    "bool": {
                        "filter": [{ "prefix": { fields::PATH: path.descendant_prefix() } }],
                        "must_not": [{ "term": { fields::PATH: path.as_str() } }]
                    }
                },
                "aggs": {
                    "segments": {
                        "terms": {
                            "script": {
                                "lang": "painless",
                                "source": CHILD_SEGMENT_SCRIPT,
                                "params": {
                                    "field": fields::PATH,
                                    "prefix": path.descendant_prefix(),
                                    "kind_field": fields::KIND,
                                    "directory": DIRECTORY
                                }
                            },
                            "size": MAX_BUCKETS
                        },
                        "aggs": {
                            "size": { "sum": { "field": fields::SIZE } },
                            "count": { "value_count": { "field": fields::PATH } },
                            "mean_heat": { "avg": { "field": fields::HEAT } }
                        }
                    }
                }
            }
        }
    })
}

/// Subtree usage grouped by the values of `field`.
pub fn terms_query(path: &IndexPath, scan_id: &ScanId, field: &str) -> Value {
    json!({
        "size": 0,
        "query": subtree_filter(path, scan_id),
        "aggs": {
            "labels": {
                "terms": { "field": field, "size": MAX_BUCKETS },
                "aggs": { "size": { "sum": { "field": fields::SIZE } } }
            }
        }
    })
}

/// Subtree usage grouped by [`HEAT_RANGES`].
pub fn heat_query(path: &IndexPath, scan_id: &ScanId) -> Value {
    let ranges: Vec<Value> = HEAT_RANGES
        .iter()
        .map(|range| {
            let mut spec = json!({ "key": range.key });
            if let Some(from) = range.from {
                spec["from"] = json!(from);
            }
            if let Some(to) = range.to {
                spec["to"] = json!(to);
            }
            spec
        })
        .collect();

    json!({
        "size": 0,
        "query": subtree_filter(path, scan_id),
        "aggs": {
            "labels": {
                "range": { "field": fields::HEAT, "ranges": ranges },
                "aggs": { "size": { "sum": { "field": fields::SIZE } } }
            }
        }
    })
}

/// Most recent completed scan whose root is `path` or one of its ancestors.
pub fn latest_scan_query(path: &IndexPath) -> Value {
    let roots: Vec<String> = path.ancestors().into_iter().map(String::from).collect();
    json!({
        "size": 1,
        "_source": [fields::SCAN_ID, fields::PATH, fields::END_TIME],
        "query": {
            "bool": {
                "filter": [
                    { "term": { fields::STATUS: COMPLETED } },
                    { "terms": { fields::PATH: roots } }
                ]
            }
        },
        "sort": [{ fields::END_TIME: { "order": "desc" } }]
    })
}
