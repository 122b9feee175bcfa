//! JSON lines: one serialized [`NodeReport`] per line.

use std::io::{BufWriter, Write};

use scanreport_core::{NodeReport, ReportError};

use crate::emitter::{ReportEmitter, emit_error};

pub struct JsonLinesEmitter<W: Write> {
    out: BufWriter<W>,
}

impl<W: Write> JsonLinesEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
        }
    }
}

impl<W: Write> ReportEmitter for JsonLinesEmitter<W> {
    fn emit(&mut self, report: &NodeReport) -> Result<(), ReportError> {
        serde_json::to_writer(&mut self.out, report).map_err(emit_error)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.out.flush()?;
        Ok(())
    }
}
