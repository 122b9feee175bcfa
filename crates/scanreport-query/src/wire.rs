//! Response decoding.
//!
//! Every field is optional on the wire; the aggregator decides what a missing
//! field means.

use chrono::{DateTime, NaiveDateTime, Utc};
use compact_str::{CompactString, ToCompactString};
use serde::Deserialize;
use serde_json::Value;

use scanreport_core::{
    CategoryResponse, ChildrenResponse, RawCategoryBucket, RawChildBucket,
};

#[derive(Debug, Deserialize)]
pub(crate) struct AggResponse<A> {
    pub aggregations: Option<A>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Metric {
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Buckets<B> {
    #[serde(default = "Vec::new")]
    pub buckets: Vec<B>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChildrenAggs {
    pub size: Option<Metric>,
    pub count: Option<Metric>,
    pub children: Option<ChildrenFilter>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChildrenFilter {
    pub segments: Option<Buckets<ChildBucketWire>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChildBucketWire {
    pub key: Option<Value>,
    pub doc_count: Option<u64>,
    pub size: Option<Metric>,
    pub count: Option<Metric>,
    pub mean_heat: Option<Metric>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryAggs {
    pub labels: Option<Buckets<CategoryBucketWire>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryBucketWire {
    pub key: Option<Value>,
    pub doc_count: Option<u64>,
    pub size: Option<Metric>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HitsResponse<S> {
    pub hits: Option<Hits<S>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hits<S> {
    #[serde(default = "Vec::new")]
    pub hits: Vec<Hit<S>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hit<S> {
    #[serde(rename = "_source")]
    pub source: Option<S>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusSource {
    pub scan_id: Option<Value>,
    pub path: Option<String>,
    pub end_time: Option<Value>,
}

impl AggResponse<ChildrenAggs> {
    pub fn into_children(self) -> ChildrenResponse {
        let Some(aggs) = self.aggregations else {
            return ChildrenResponse::default();
        };
        let buckets = aggs
            .children
            .and_then(|c| c.segments)
            .map(|s| s.buckets)
            .unwrap_or_default()
            .into_iter()
            .map(|b| RawChildBucket {
                key: key_string(b.key),
                count: metric_u64(b.count),
                size: metric_u64(b.size),
                doc_count: b.doc_count,
                mean_heat: b.mean_heat.and_then(|m| m.value),
            })
            .collect();

        ChildrenResponse {
            buckets,
            total_size: metric_u64(aggs.size),
            total_count: metric_u64(aggs.count),
        }
    }
}

impl AggResponse<CategoryAggs> {
    pub fn into_categories(self) -> CategoryResponse {
        let buckets = self
            .aggregations
            .and_then(|a| a.labels)
            .map(|l| l.buckets)
            .unwrap_or_default()
            .into_iter()
            .map(|b| RawCategoryBucket {
                label: key_string(b.key),
                count: b.doc_count,
                size: metric_u64(b.size),
            })
            .collect();
        CategoryResponse { buckets }
    }
}

impl<S> HitsResponse<S> {
    pub fn into_first(self) -> Option<S> {
        self.hits?.hits.into_iter().next()?.source
    }
}

/// Bucket keys are strings for keyword fields and numbers for numeric ones.
pub(crate) fn key_string(key: Option<Value>) -> Option<CompactString> {
    match key? {
        Value::String(s) => Some(s.into()),
        Value::Number(n) => Some(n.to_compact_string()),
        _ => None,
    }
}

/// Sums and counts arrive as floats; negative or non-finite values are
/// treated as absent.
fn metric_u64(metric: Option<Metric>) -> Option<u64> {
    let value = metric?.value?;
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

/// Accepts RFC 3339 strings, zone-less ISO timestamps, and epoch milliseconds.
pub(crate) fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|t| t.and_utc())
            }),
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
        _ => None,
    }
}
