//! [`QueryGateway`] and [`ScanResolver`] over Elasticsearch.

use serde_json::Value;
use tracing::debug;

use scanreport_core::{
    CategoryResponse, ChildrenResponse, ConnectionConfig, IndexPath, QueryError, QueryGateway,
    ScanId, ScanResolver, ScanSnapshot,
};

use crate::client::SearchClient;
use crate::queries::{self, fields};
use crate::wire::{
    AggResponse, CategoryAggs, ChildrenAggs, HitsResponse, StatusSource, key_string, parse_time,
};

/// Search-cluster backed gateway.
pub struct ElasticGateway {
    client: SearchClient,
}

impl ElasticGateway {
    /// Create a gateway from connection settings.
    pub fn new(config: &ConnectionConfig) -> Self {
        Self::with_client(SearchClient::new(config))
    }

    /// Create a gateway over an existing client.
    pub fn with_client(client: SearchClient) -> Self {
        Self { client }
    }

    fn categories(&self, index: &str, body: &Value) -> Result<CategoryResponse, QueryError> {
        let response: AggResponse<CategoryAggs> = self.client.search(index, body)?;
        Ok(response.into_categories())
    }
}

impl QueryGateway for ElasticGateway {
    fn children_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<ChildrenResponse, QueryError> {
        let body = queries::children_query(path, scan_id);
        let response: AggResponse<ChildrenAggs> = self.client.search(index, &body)?;
        Ok(response.into_children())
    }

    fn user_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError> {
        self.categories(index, &queries::terms_query(path, scan_id, fields::USER))
    }

    fn filetype_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError> {
        self.categories(index, &queries::terms_query(path, scan_id, fields::EXTENSION))
    }

    fn heat_breakdown(
        &self,
        path: &IndexPath,
        index: &str,
        scan_id: &ScanId,
    ) -> Result<CategoryResponse, QueryError> {
        self.categories(index, &queries::heat_query(path, scan_id))
    }
}

impl ScanResolver for ElasticGateway {
    fn latest_scan(
        &self,
        path: &IndexPath,
        status_index: &str,
    ) -> Result<Option<ScanSnapshot>, QueryError> {
        let body = queries::latest_scan_query(path);
        let response: HitsResponse<StatusSource> = self.client.search(status_index, &body)?;

        let Some(source) = response.into_first() else {
            debug!(path = %path, "no completed scan");
            return Ok(None);
        };
        let scan_id = key_string(source.scan_id).ok_or_else(|| QueryError::Decode {
            message: "status record has no scan_id".to_string(),
        })?;

        let scan_root = source.path.map(IndexPath::new).unwrap_or_else(|| path.clone());
        let snapshot = ScanSnapshot::new(scan_id, scan_root, status_index);
        Ok(Some(match source.end_time.as_ref().and_then(parse_time) {
            Some(completed_at) => snapshot.with_completed_at(completed_at),
            None => snapshot,
        }))
    }
}
