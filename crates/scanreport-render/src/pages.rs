//! Paged text document: one page per node, pages separated by form feeds.

use std::io::{BufWriter, Write};

use scanreport_core::{NodeReport, ReportError};
use tracing::debug;

use crate::emitter::{Detail, ReportEmitter};
use crate::format::{format_count, format_size};
use crate::table::{RowOrder, Table, category_rows, child_rows};

const PAGE_BREAK: char = '\x0c';
const HEADER_WIDTH: usize = 64;

/// Renders each report as a page of aligned tables.
///
/// Every section is sorted by size, smallest first.
pub struct PagedEmitter<W: Write> {
    out: BufWriter<W>,
    detail: Detail,
    pages: usize,
}

impl<W: Write> PagedEmitter<W> {
    pub fn new(out: W, detail: Detail) -> Self {
        Self {
            out: BufWriter::new(out),
            detail,
            pages: 0,
        }
    }

    fn tables(&self, report: &NodeReport) -> Vec<Table> {
        let mut tables = Vec::with_capacity(5);

        if self.detail.is_full() {
            let mut top = Table::new("Top level", &["path", "size", "count", "scan"]);
            top.push(vec![
                report.path.to_string(),
                format_size(report.total_size),
                format_count(report.total_count),
                report.scan_id.to_string(),
            ]);
            tables.push(top);
        }

        tables.push(Table::sized(
            "Children",
            "path",
            &child_rows(report, RowOrder::Size),
        ));
        tables.push(Table::sized(
            "Users",
            "user",
            &category_rows(&report.users, RowOrder::Size),
        ));
        if self.detail.is_full() {
            tables.push(Table::sized(
                "Filetypes",
                "extension",
                &category_rows(&report.filetypes, RowOrder::Size),
            ));
        }
        tables.push(Table::sized(
            "Heat (days since last access)",
            "range",
            &category_rows(&report.heat, RowOrder::Size),
        ));

        tables
    }
}

impl<W: Write> ReportEmitter for PagedEmitter<W> {
    fn emit(&mut self, report: &NodeReport) -> Result<(), ReportError> {
        if self.pages > 0 {
            writeln!(self.out, "{PAGE_BREAK}")?;
        }
        debug!(path = %report.path, page = self.pages + 1, "writing page");

        writeln!(self.out, "{}", report.path)?;
        writeln!(
            self.out,
            "{} in {} entries",
            format_size(report.total_size),
            format_count(report.total_count)
        )?;
        writeln!(self.out, "{}", "=".repeat(HEADER_WIDTH))?;

        for table in self.tables(report) {
            writeln!(self.out)?;
            table.write_text(&mut self.out)?;
        }

        if report.has_warnings() {
            writeln!(self.out)?;
            writeln!(self.out, "Warnings")?;
            for warning in &report.warnings {
                writeln!(self.out, "  ! {}", warning.message)?;
            }
        }

        self.pages += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.out.flush()?;
        Ok(())
    }
}
