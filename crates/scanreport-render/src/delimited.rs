//! Comma-separated report blocks.

use std::io::{BufWriter, Write};

use scanreport_core::{NodeReport, ReportError};

use crate::emitter::{Detail, ReportEmitter};
use crate::format::{format_count, format_size};
use crate::table::{RowOrder, Table, category_rows, child_rows};

const HEAT_TITLE: &str = "Heat (Last access time using atime)";

/// Writes one block of CSV tables per report, separated by blank lines.
///
/// Children are listed by name and users and heat by label, while filetypes
/// are sorted by size.
pub struct CsvEmitter<W: Write> {
    out: BufWriter<W>,
    detail: Detail,
}

impl<W: Write> CsvEmitter<W> {
    pub fn new(out: W, detail: Detail) -> Self {
        Self {
            out: BufWriter::new(out),
            detail,
        }
    }

    fn section(&mut self, table: &Table) -> Result<(), ReportError> {
        table.write_csv(&mut self.out)?;
        writeln!(self.out)?;
        Ok(())
    }
}

impl<W: Write> ReportEmitter for CsvEmitter<W> {
    fn emit(&mut self, report: &NodeReport) -> Result<(), ReportError> {
        let children = Table::sized("Children", "path", &child_rows(report, RowOrder::Label));
        let users = Table::sized(
            "Users",
            "user",
            &category_rows(&report.users, RowOrder::Label),
        );
        let heat = Table::sized(
            HEAT_TITLE,
            "range",
            &category_rows(&report.heat, RowOrder::Label),
        );

        match self.detail {
            Detail::Brief => {
                writeln!(self.out, "At level {}", report.path)?;
                self.section(&children)?;
                self.section(&users)?;
                self.section(&heat)?;
            }
            Detail::Full => {
                let mut top = Table::new(
                    "Top level",
                    &["path", "total_size", "total_count", "scan_id"],
                );
                top.push(vec![
                    report.path.to_string(),
                    format_size(report.total_size),
                    format_count(report.total_count),
                    report.scan_id.to_string(),
                ]);
                let filetypes = Table::sized(
                    "Filetype",
                    "extension",
                    &category_rows(&report.filetypes, RowOrder::Size),
                );

                self.section(&top)?;
                self.section(&children)?;
                self.section(&users)?;
                self.section(&filetypes)?;
                self.section(&heat)?;
            }
        }

        if report.has_warnings() {
            let mut warnings = Table::new("Warnings", &["kind", "message"]);
            for warning in &report.warnings {
                warnings.push(vec![warning.kind.to_string(), warning.message.clone()]);
            }
            self.section(&warnings)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.out.flush()?;
        Ok(())
    }
}
