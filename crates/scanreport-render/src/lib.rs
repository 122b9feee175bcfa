//! Report emitters for scanreport.
//!
//! Three output documents are supported:
//!
//! - [`PagedEmitter`]: a text document with one page of aligned tables per
//!   directory, pages separated by form feeds
//! - [`CsvEmitter`]: comma-separated blocks, one per directory
//! - [`JsonLinesEmitter`]: one JSON object per directory
//!
//! Sizes are shown in decimal units and counts in words above one million.

mod delimited;
mod emitter;
pub mod format;
mod json;
mod pages;
pub mod table;

pub use delimited::CsvEmitter;
pub use emitter::{Detail, OutputFormat, ReportEmitter, emitter_for};
pub use format::{format_count, format_size};
pub use json::JsonLinesEmitter;
pub use pages::PagedEmitter;
