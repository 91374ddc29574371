use std::io::{self, Write};

use itertools::Itertools;
use log::warn;
use thiserror::Error;

use crate::row::{EventRow, Value};

const TABLE_START: &str = "# ";
const SEPARATOR: &str = "\t";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write output")]
    Io(#[from] io::Error),
}

/// Writer for tab-separated tables of event rows
///
/// The first line names the table. The column header is written together
/// with the first row and fixes the set of reweighting columns.
#[derive(Debug)]
pub struct Writer<Stream: Write> {
    stream: Stream,
    reweight_ids: Vec<String>,
    dropped_reweights: Vec<String>,
    rows: usize,
    line: String,
}

impl<Stream: Write> Writer<Stream> {
    pub fn new(mut stream: Stream, table: &str) -> Result<Writer<Stream>, WriteError> {
        let output = [TABLE_START, table, "\n"];
        for text in &output {
            stream.write_all(text.as_bytes())?;
        }
        Ok(Writer {
            stream,
            reweight_ids: Vec::new(),
            dropped_reweights: Vec::new(),
            rows: 0,
            line: String::new(),
        })
    }

    /// Number of rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Ids of reweighting factors that appeared after the header was written
    pub fn dropped_reweights(&self) -> &[String] {
        &self.dropped_reweights
    }

    pub fn write_row(&mut self, row: &EventRow) -> Result<(), WriteError> {
        if self.rows == 0 {
            self.reweight_ids = row.reweights.iter().map(|rw| rw.id.clone()).collect();
            self.write_header(row)?;
        } else {
            for rw in &row.reweights {
                if !self.reweight_ids.contains(&rw.id) && !self.dropped_reweights.contains(&rw.id) {
                    warn!("Dropping reweighting factor '{}' without column", rw.id);
                    self.dropped_reweights.push(rw.id.clone());
                }
            }
        }

        let line = &mut self.line;
        line.clear();
        let mut float = ryu::Buffer::new();
        let mut first = true;
        row.for_each_column(&self.reweight_ids, |_, value| {
            if !first {
                line.push_str(SEPARATOR);
            }
            first = false;
            match value {
                Some(Value::Float(x)) => line.push_str(float.format(x)),
                Some(Value::Int(n)) => line.push_str(&n.to_string()),
                None => {}
            }
        });
        line.push('\n');
        self.stream.write_all(line.as_bytes())?;
        self.rows += 1;
        Ok(())
    }

    fn write_header(&mut self, row: &EventRow) -> Result<(), WriteError> {
        let mut names = Vec::new();
        row.for_each_column(&self.reweight_ids, |name, _| names.push(name.to_string()));
        let header = names.iter().join(SEPARATOR);
        self.stream.write_all(header.as_bytes())?;
        self.stream.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the output and return the underlying stream
    pub fn finish(mut self) -> Result<Stream, WriteError> {
        self.stream.flush()?;
        Ok(self.stream)
    }
}
