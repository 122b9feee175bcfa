//! The emitter seam and its construction.

use std::io::Write;

use strum::{Display, EnumString};

use scanreport_core::{NodeReport, ReportError};

use crate::delimited::CsvEmitter;
use crate::json::JsonLinesEmitter;
use crate::pages::PagedEmitter;

/// Sink for node reports, called once per report in walk order.
pub trait ReportEmitter {
    /// Render one node report.
    fn emit(&mut self, report: &NodeReport) -> Result<(), ReportError>;

    /// Flush everything written so far. Called once after the last report.
    fn finish(&mut self) -> Result<(), ReportError>;
}

/// Output document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Paged text document, one page per node.
    #[default]
    Pages,
    /// Comma-separated blocks.
    Csv,
    /// One JSON object per line.
    Json,
}

/// How much of each report the text formats include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detail {
    /// Children, users and heat.
    Brief,
    /// Adds the top-level totals and the filetype table.
    #[default]
    Full,
}

impl Detail {
    pub fn from_brief(brief: bool) -> Self {
        if brief { Self::Brief } else { Self::Full }
    }

    pub fn is_full(self) -> bool {
        self == Self::Full
    }
}

/// Build the emitter for `format` writing to `out`.
///
/// JSON lines always carry the full report; `detail` only shapes the text
/// formats.
pub fn emitter_for<W: Write + 'static>(
    format: OutputFormat,
    detail: Detail,
    out: W,
) -> Box<dyn ReportEmitter> {
    match format {
        OutputFormat::Pages => Box::new(PagedEmitter::new(out, detail)),
        OutputFormat::Csv => Box::new(CsvEmitter::new(out, detail)),
        OutputFormat::Json => Box::new(JsonLinesEmitter::new(out)),
    }
}

pub(crate) fn emit_error(err: serde_json::Error) -> ReportError {
    ReportError::Emit {
        message: err.to_string(),
    }
}
