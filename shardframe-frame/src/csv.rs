//! Pull-based CSV export.
//!
//! The stream lazily materializes one row per refill: quoted header names,
//! unquoted numeric and integer values, quoted categorical labels, blank for
//! missing. Every line is newline-terminated, including the last row, and
//! the stream ends after the last row with no trailing output.

use crate::frame::Frame;
use shardframe_column::{ChunkData, Column, Value};
use shardframe_result::{Error, Result};
use shardframe_storage::ChunkStore;
use std::io::{self, Read};
use std::sync::Arc;

/// Configuration for CSV export.
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Write a header row with quoted column names when true.
    pub include_header: bool,
    /// Delimiter to use between fields.
    pub delimiter: u8,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            delimiter: b',',
        }
    }
}

/// A `Read` that produces the frame's rows as CSV bytes, one row at a time.
pub struct CsvStream<'a, S: ChunkStore> {
    store: &'a S,
    columns: Vec<Arc<Column>>,
    names: Vec<String>,
    delimiter: u8,
    n_rows: u64,
    row: u64,
    line: Vec<u8>,
    pos: usize,
    /// Per-column decoded chunk cache so sequential rows do not refetch.
    cache: Vec<Option<(usize, ChunkData)>>,
}

impl<'a, S: ChunkStore> CsvStream<'a, S> {
    pub fn new(frame: &Frame, store: &'a S, options: &CsvWriteOptions) -> Result<Self> {
        frame.check_compatible()?;
        let mut columns = Vec::with_capacity(frame.n_cols());
        for (name, handle) in frame.names().iter().zip(frame.handles()) {
            let col = handle.as_ready().ok_or_else(|| {
                Error::InvalidArgumentError(format!(
                    "column {name} is still being built; close builders before export"
                ))
            })?;
            columns.push(Arc::clone(col));
        }

        let mut line = Vec::new();
        if options.include_header && !frame.names().is_empty() {
            for (i, name) in frame.names().iter().enumerate() {
                if i > 0 {
                    line.push(options.delimiter);
                }
                line.push(b'"');
                line.extend_from_slice(name.as_bytes());
                line.push(b'"');
            }
            line.push(b'\n');
        }

        let n_rows = frame.n_rows();
        tracing::trace!(n_rows, columns = columns.len(), "starting CSV export");
        Ok(Self {
            store,
            cache: vec![None; columns.len()],
            names: frame.names().to_vec(),
            columns,
            delimiter: options.delimiter,
            n_rows,
            row: 0,
            line,
            pos: 0,
        })
    }

    fn value_at(&mut self, column: usize, row: u64) -> Result<Value> {
        let col = &self.columns[column];
        let cidx = col.group().chunk_of_row(row);
        let cached = &mut self.cache[column];
        if !matches!(cached, Some((idx, _)) if *idx == cidx) {
            *cached = Some((cidx, col.chunk(self.store, cidx)?));
        }
        let (_, chunk) = cached.as_ref().expect("chunk cached above");
        Ok(chunk.value((row - col.group().chunk_start(cidx)) as usize))
    }

    fn fill_row_line(&mut self) -> Result<()> {
        let row = self.row;
        let mut line = Vec::new();
        for column in 0..self.columns.len() {
            if column > 0 {
                line.push(self.delimiter);
            }
            match self.value_at(column, row)? {
                // Missing renders as an empty field.
                Value::Missing => {}
                Value::Numeric(v) => line.extend_from_slice(v.to_string().as_bytes()),
                Value::Integer(v) => line.extend_from_slice(v.to_string().as_bytes()),
                Value::Code(code) => {
                    let col = &self.columns[column];
                    let label = col
                        .domain()
                        .and_then(|d| d.get(code as usize))
                        .ok_or_else(|| {
                            Error::Internal(format!(
                                "category code {code} outside dictionary of column {}",
                                self.names[column]
                            ))
                        })?;
                    line.push(b'"');
                    line.extend_from_slice(label.as_bytes());
                    line.push(b'"');
                }
            }
        }
        line.push(b'\n');
        self.line = line;
        self.pos = 0;
        self.row += 1;
        Ok(())
    }

    /// Bytes available without materializing another row; refills from the
    /// next row when the current line is exhausted. Zero means end of
    /// stream.
    fn available(&mut self) -> Result<usize> {
        if self.pos == self.line.len() {
            if self.row == self.n_rows {
                return Ok(0);
            }
            self.fill_row_line()?;
        }
        Ok(self.line.len() - self.pos)
    }
}

impl<S: ChunkStore> Read for CsvStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self
            .available()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        if n == 0 || buf.is_empty() {
            return Ok(0);
        }
        let n = n.min(buf.len());
        buf[..n].copy_from_slice(&self.line[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Frame {
    /// Stream this frame as CSV.
    pub fn to_csv<'a, S: ChunkStore>(
        &self,
        store: &'a S,
        options: &CsvWriteOptions,
    ) -> Result<CsvStream<'a, S>> {
        CsvStream::new(self, store, options)
    }
}
