//! Titled tables shared by the text and CSV emitters.

use std::io::{self, Write};

use itertools::Itertools;

use scanreport_core::CategoryBreakdown;
use scanreport_core::NodeReport;

use crate::format::{format_count, format_size};

/// One labelled size/count line before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub size: u64,
    pub count: u64,
}

impl Row {
    fn cells(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            format_size(self.size),
            format_count(self.count),
        ]
    }
}

/// How a section's rows are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Ascending by size, ties keep input order.
    Size,
    /// Lexical by label.
    Label,
}

/// Children with a non-zero size, placeholder included.
pub fn child_rows(report: &NodeReport, order: RowOrder) -> Vec<Row> {
    let rows = report
        .children
        .iter()
        .filter(|c| c.size > 0)
        .map(|c| Row {
            label: c.path.to_string(),
            size: c.size,
            count: c.count,
        });
    sort_rows(rows, order)
}

/// Rows of a user, filetype or heat breakdown.
pub fn category_rows(breakdown: &CategoryBreakdown, order: RowOrder) -> Vec<Row> {
    let rows = breakdown.iter().map(|(label, bucket)| Row {
        label: label.to_string(),
        size: bucket.size,
        count: bucket.count,
    });
    sort_rows(rows, order)
}

fn sort_rows(rows: impl Iterator<Item = Row>, order: RowOrder) -> Vec<Row> {
    match order {
        RowOrder::Size => rows.sorted_by_key(|r| r.size).collect(),
        RowOrder::Label => rows.sorted_by(|a, b| a.label.cmp(&b.label)).collect(),
    }
}

/// A titled table of string cells.
#[derive(Debug, Clone)]
pub struct Table {
    title: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>, header: &[&str]) -> Self {
        Self {
            title: title.into(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Table with `label_header, size, count` columns filled from `rows`.
    pub fn sized(title: impl Into<String>, label_header: &str, rows: &[Row]) -> Self {
        let mut table = Self::new(title, &[label_header, "size", "count"]);
        table.rows = rows.iter().map(Row::cells).collect();
        table
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Aligned plain text: first column left-aligned, the rest right-aligned.
    pub fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        let columns = self.header.len();
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        writeln!(out, "{}", self.title)?;
        let rule_width = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
        let render = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &width))| {
                    if i == 0 {
                        format!("{cell:<width$}")
                    } else {
                        format!("{cell:>width$}")
                    }
                })
                .join("  ")
        };

        writeln!(out, "{}", render(&self.header).trim_end())?;
        writeln!(out, "{}", "-".repeat(rule_width))?;
        if self.rows.is_empty() {
            writeln!(out, "(none)")?;
        }
        for row in &self.rows {
            writeln!(out, "{}", render(row).trim_end())?;
        }
        Ok(())
    }

    /// Comma-separated block: title line, header line, then rows.
    pub fn write_csv(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", escape_csv(&self.title))?;
        writeln!(out, "{}", self.header.iter().map(|c| escape_csv(c)).join(","))?;
        for row in &self.rows {
            writeln!(out, "{}", row.iter().map(|c| escape_csv(c)).join(","))?;
        }
        Ok(())
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
pub fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
