//! Elasticsearch backend for scanreport.
//!
//! [`ElasticGateway`] answers the four aggregate questions and resolves the
//! latest completed scan, talking to the cluster over blocking HTTP.
//!
//! The scanner is expected to index one document per filesystem entry with
//! at least these fields:
//!
//! | field       | meaning                                   |
//! |-------------|-------------------------------------------|
//! | `path`      | absolute path (keyword)                   |
//! | `scan_id`   | scan the document belongs to              |
//! | `size`      | size in bytes                             |
//! | `user`      | owning user name                          |
//! | `extension` | file extension, empty for none            |
//! | `heat`      | days since last access                    |
//! | `type`      | `directory` for directories (optional)    |
//!
//! Only directories and the parents of deeper entries become children of a
//! report; files directly in a directory are counted in its unindexed
//! remainder. Without `type`, empty directories are not listed.
//!
//! and one status document per scan with `scan_id`, `path` (scan root),
//! `status` and `end_time`.
//!
//! ```rust,no_run
//! use scanreport_core::{ConnectionConfig, IndexPath, ScanResolver};
//! use scanreport_query::ElasticGateway;
//!
//! let config = ConnectionConfig::load("config.toml".as_ref()).unwrap();
//! let gateway = ElasticGateway::new(&config);
//! let scan = gateway
//!     .latest_scan(&IndexPath::new("/data"), &config.status_index)
//!     .unwrap();
//! ```

mod client;
mod gateway;
pub mod queries;
mod wire;

pub use client::SearchClient;
pub use gateway::ElasticGateway;
