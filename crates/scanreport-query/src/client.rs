//! Blocking HTTP client for the search cluster.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use scanreport_core::{ConnectionConfig, QueryError};

const API_KEY_HEADER: &str = "x-api-key";

/// Longest error body kept in a [`QueryError::Status`].
const MAX_ERROR_BODY: usize = 2048;

/// Issues `_search` requests against the first reachable host.
///
/// Hosts are tried in configured order. A transport failure (refused
/// connection, timeout, DNS) moves on to the next host; an HTTP error status
/// is returned immediately since another node would answer the same.
pub struct SearchClient {
    agent: ureq::Agent,
    hosts: Vec<String>,
    api_key: Option<String>,
}

impl SearchClient {
    /// Create a client from connection settings.
    pub fn new(config: &ConnectionConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        let hosts = config
            .es_hosts
            .iter()
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .collect();

        Self {
            agent,
            hosts,
            api_key: config.es_api_key.clone(),
        }
    }

    /// Hosts in the order they are tried.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Run a search request and decode the response body.
    pub fn search<T: DeserializeOwned>(&self, index: &str, body: &Value) -> Result<T, QueryError> {
        let mut last_error = QueryError::NoHosts;

        for host in &self.hosts {
            let url = format!("{host}/{index}/_search");
            debug!(url = %url, "search request");

            let mut request = self.agent.post(&url).set("Accept", "application/json");
            if let Some(key) = &self.api_key {
                request = request.set(API_KEY_HEADER, key);
            }

            match request.send_json(body) {
                Ok(response) => {
                    return response.into_json::<T>().map_err(|e| QueryError::Decode {
                        message: e.to_string(),
                    });
                }
                Err(ureq::Error::Status(code, response)) => {
                    let body = response.into_string().unwrap_or_default();
                    return Err(QueryError::Status {
                        code,
                        body: truncate(body, MAX_ERROR_BODY),
                    });
                }
                Err(ureq::Error::Transport(err)) => {
                    warn!(host = %host, error = %err, "search host unreachable");
                    last_error = QueryError::Transport {
                        host: host.clone(),
                        message: err.to_string(),
                    };
                }
            }
        }

        Err(last_error)
    }
}

fn truncate(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}
