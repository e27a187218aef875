//! Named, ordered collections of column handles.

use shardframe_column::{Column, ColumnBuilder, ColumnType, Value};
use shardframe_result::{Error, Result};
use shardframe_storage::{ChunkStore, Pending};
use std::fmt;
use std::sync::Arc;

/// A column slot in a frame: either a finalized, readable column or a
/// builder still being populated. Builders have no chunk layout yet and are
/// treated as trivially compatible with everything.
#[derive(Clone, Debug)]
pub enum ColumnHandle {
    Ready(Arc<Column>),
    Building(Arc<ColumnBuilder>),
}

impl ColumnHandle {
    pub fn as_ready(&self) -> Option<&Arc<Column>> {
        match self {
            ColumnHandle::Ready(col) => Some(col),
            ColumnHandle::Building(_) => None,
        }
    }

    pub fn is_building(&self) -> bool {
        matches!(self, ColumnHandle::Building(_))
    }

    pub fn ty(&self) -> &ColumnType {
        match self {
            ColumnHandle::Ready(col) => col.ty(),
            ColumnHandle::Building(b) => b.ty(),
        }
    }

    /// Dictionary of category labels, present iff categorical.
    pub fn domain(&self) -> Option<&Arc<[String]>> {
        self.ty().domain()
    }
}

impl From<Arc<Column>> for ColumnHandle {
    fn from(col: Arc<Column>) -> Self {
        ColumnHandle::Ready(col)
    }
}

impl From<Column> for ColumnHandle {
    fn from(col: Column) -> Self {
        ColumnHandle::Ready(Arc::new(col))
    }
}

/// A collection of named columns. Frames are lightweight: they hold `Arc`
/// handles, so constructing, copying, and discarding them never touches
/// column data. Names need not be unique; lookups return the first match.
/// Order is significant (by convention, not enforcement, the last column is
/// the prediction target in ML use).
#[derive(Clone, Debug, Default)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<ColumnHandle>,
}

impl Frame {
    pub fn new(names: Vec<String>, columns: Vec<ColumnHandle>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(Error::InvalidArgumentError(format!(
                "{} names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        Ok(Self { names, columns })
    }

    pub fn from_columns(names: Vec<String>, columns: Vec<Arc<Column>>) -> Result<Self> {
        Self::new(names, columns.into_iter().map(ColumnHandle::Ready).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn handles(&self) -> &[ColumnHandle] {
        &self.columns
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Total row count, 0 when no column is readable yet.
    pub fn n_rows(&self) -> u64 {
        self.any_column().map(|c| c.len()).unwrap_or(0)
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn handle(&self, idx: usize) -> &ColumnHandle {
        &self.columns[idx]
    }

    /// Index of the first column with a matching name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// First readable column. Recomputed on every call; there is
    /// deliberately no memoized copy to go stale across structural edits.
    pub fn any_column(&self) -> Option<&Arc<Column>> {
        self.columns.iter().find_map(|h| h.as_ready())
    }

    /// Append a named column. No compatibility check here; callers run
    /// [`Frame::check_compatible`] before computing over the frame.
    pub fn add(&mut self, name: impl Into<String>, handle: impl Into<ColumnHandle>) {
        self.names.push(name.into());
        self.columns.push(handle.into());
    }

    /// Remove the first column with a matching name.
    pub fn remove_by_name(&mut self, name: &str) -> Option<ColumnHandle> {
        let idx = self.find(name)?;
        self.remove(idx).ok()
    }

    /// Remove a numbered column.
    pub fn remove(&mut self, idx: usize) -> Result<ColumnHandle> {
        if idx >= self.columns.len() {
            return Err(Error::InvalidArgumentError(format!(
                "column index {idx} out of range for {} columns",
                self.columns.len()
            )));
        }
        self.names.remove(idx);
        Ok(self.columns.remove(idx))
    }

    /// Remove a set of numbered columns. All indices are validated before
    /// anything is removed; handles come back in ascending index order.
    pub fn remove_many(&mut self, idxs: &[usize]) -> Result<Vec<ColumnHandle>> {
        for &i in idxs {
            if i >= self.columns.len() {
                return Err(Error::InvalidArgumentError(format!(
                    "column index {i} out of range for {} columns",
                    self.columns.len()
                )));
            }
        }
        let mut sorted: Vec<usize> = idxs.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut removed = Vec::with_capacity(sorted.len());
        let mut kept_names = Vec::with_capacity(self.names.len() - sorted.len());
        let mut kept_cols = Vec::with_capacity(self.columns.len() - sorted.len());
        let mut next = sorted.iter().copied().peekable();
        for (i, (name, col)) in self
            .names
            .drain(..)
            .zip(self.columns.drain(..))
            .enumerate()
        {
            if next.peek() == Some(&i) {
                next.next();
                removed.push(col);
            } else {
                kept_names.push(name);
                kept_cols.push(col);
            }
        }
        self.names = kept_names;
        self.columns = kept_cols;
        Ok(removed)
    }

    /// All categorical dictionaries; `None` for non-categorical columns.
    pub fn domains(&self) -> Vec<Option<Arc<[String]>>> {
        self.columns
            .iter()
            .map(|h| h.domain().cloned())
            .collect()
    }

    /// Sum of the finalized columns' serialized sizes.
    pub fn byte_size(&self) -> u64 {
        self.columns
            .iter()
            .filter_map(|h| h.as_ready())
            .map(|c| c.byte_size())
            .sum()
    }

    /// True if any column is still a builder.
    pub fn has_builders(&self) -> bool {
        self.columns.iter().any(|h| h.is_building())
    }

    /// Close every builder column in place, replacing it with its finalized
    /// column.
    pub fn close_builders<S: ChunkStore>(&mut self, store: &S) -> Result<()> {
        for handle in &mut self.columns {
            if let ColumnHandle::Building(builder) = handle {
                *handle = ColumnHandle::Ready(Arc::new(builder.close(store)?));
            }
        }
        Ok(())
    }

    /// Check that all finalized columns share one chunk layout: same chunk
    /// count, same per-chunk starting row offsets. Builder columns are
    /// skipped; their layout does not exist yet. A frame with nothing
    /// readable to compare is vacuously compatible.
    pub fn check_compatible(&self) -> Result<()> {
        let reference = match self.any_column() {
            Some(col) => col,
            None => return Ok(()),
        };
        let n_chunks = reference.n_chunks();
        for col in self.columns.iter().filter_map(|h| h.as_ready()) {
            if col.n_chunks() != n_chunks {
                return Err(Error::chunk_count_mismatch(
                    n_chunks as u64,
                    col.n_chunks() as u64,
                ));
            }
        }
        for i in 0..n_chunks {
            let start = reference.chunk_start(i);
            for col in self.columns.iter().filter_map(|h| h.as_ready()) {
                if col.chunk_start(i) != start {
                    return Err(Error::chunk_start_mismatch(start, col.chunk_start(i)));
                }
            }
        }
        Ok(())
    }

    /// Drop this frame and release its finalized columns' chunks from the
    /// store. Removal is deferred; callers wait on `pending`. Columns shared
    /// with other frames become unreadable, so full removal is for owners
    /// only — to merely discard the handle set, drop the frame instead.
    pub fn destroy<S: ChunkStore>(&mut self, store: &S, pending: &Pending) -> Result<()> {
        for col in self.columns.iter().filter_map(|h| h.as_ready()) {
            col.release(store, pending)?;
        }
        self.names.clear();
        self.columns.clear();
        Ok(())
    }

    /// Render one row as `{name=value,...}`, `NA` for missing values.
    pub fn format_row<S: ChunkStore>(&self, store: &S, row: u64) -> Result<String> {
        let mut out = String::from("{");
        for (i, (name, handle)) in self.names.iter().zip(&self.columns).enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(name);
            out.push('=');
            let col = handle.as_ready().ok_or_else(|| {
                Error::InvalidArgumentError(format!("column {name} is not readable yet"))
            })?;
            match col.value(store, row)? {
                Value::Missing => out.push_str("NA"),
                Value::Numeric(v) => out.push_str(&v.to_string()),
                Value::Integer(v) => out.push_str(&v.to_string()),
                Value::Code(code) => {
                    let label = col
                        .domain()
                        .and_then(|d| d.get(code as usize).cloned())
                        .ok_or_else(|| {
                            Error::Internal(format!("category code {code} outside dictionary"))
                        })?;
                    out.push_str(&label);
                }
            }
        }
        out.push('}');
        Ok(out)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}, {} bytes", self.names.join(","), self.byte_size())?;
        if let Some(col) = self.any_column() {
            write!(f, "\nChunk starts: {{")?;
            for i in 0..col.n_chunks() {
                write!(f, "{},", col.chunk_start(i))?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}
