//! Write-side builders: per-chunk append buffers and the not-yet-laid-out
//! column that collects them.
//!
//! The lifecycle is cooperative and two-phase. Many parallel workers each own
//! a [`ChunkBuilder`] targeting one chunk index and commit it into the shared
//! [`ColumnBuilder`]'s slot for that index; one orchestrator closes the
//! column builder after every worker has finished. The column builder is an
//! explicit state machine (`Open` with pending slots, then `Closed`), so a
//! double close or a close with unfilled slots is a hard error rather than a
//! silently corrupt column.

use crate::chunk::{ColumnType, Value};
use crate::column::Column;
use crate::group::ColumnGroup;
use crate::serde::serialize_chunk;
use crate::types::BuilderId;
use arrow::array::{Float64Builder, Int64Builder, UInt32Builder};
use shardframe_result::{Error, Result};
use shardframe_storage::{BatchPut, ChunkKey, ChunkStore};
use std::sync::{Arc, Mutex};

/// A committed chunk: its store key plus the counts the close step needs to
/// derive the chunk layout.
#[derive(Clone, Copy, Debug)]
pub struct SealedChunk {
    pub key: ChunkKey,
    pub rows: u64,
    pub bytes: u64,
}

enum ValuesBuilder {
    Numeric(Float64Builder),
    Integer(Int64Builder),
    Codes(UInt32Builder),
}

/// Append-only buffer for exactly one output chunk of one column builder.
///
/// Created per task invocation, filled by a single worker, then closed,
/// which serializes the buffer into the store and commits it to the owning
/// column builder's slot for the target chunk index.
pub struct ChunkBuilder {
    target_chunk: usize,
    rows: u64,
    values: ValuesBuilder,
}

impl ChunkBuilder {
    pub fn new(ty: &ColumnType, target_chunk: usize) -> Self {
        let values = match ty {
            ColumnType::Numeric => ValuesBuilder::Numeric(Float64Builder::new()),
            ColumnType::Integer => ValuesBuilder::Integer(Int64Builder::new()),
            ColumnType::Categorical(_) => ValuesBuilder::Codes(UInt32Builder::new()),
        };
        Self {
            target_chunk,
            rows: 0,
            values,
        }
    }

    pub fn target_chunk(&self) -> usize {
        self.target_chunk
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Append one value. Missing markers are accepted for every kind; a
    /// present value must match the builder's kind.
    pub fn push(&mut self, value: Value) -> Result<()> {
        if value.is_missing() {
            return self.push_missing();
        }
        match (&mut self.values, value) {
            (ValuesBuilder::Numeric(b), Value::Numeric(v)) => {
                b.append_value(v);
                self.rows += 1;
                Ok(())
            }
            (ValuesBuilder::Integer(b), Value::Integer(v)) => {
                b.append_value(v);
                self.rows += 1;
                Ok(())
            }
            (ValuesBuilder::Codes(b), Value::Code(v)) => {
                b.append_value(v);
                self.rows += 1;
                Ok(())
            }
            (_, other) => Err(Error::InvalidArgumentError(format!(
                "value {other:?} does not match chunk builder kind"
            ))),
        }
    }

    /// Append a missing-value marker.
    pub fn push_missing(&mut self) -> Result<()> {
        match &mut self.values {
            ValuesBuilder::Numeric(b) => b.append_null(),
            ValuesBuilder::Integer(b) => b.append_null(),
            ValuesBuilder::Codes(b) => b.append_null(),
        }
        self.rows += 1;
        Ok(())
    }

    /// Serialize the buffered values into the store and commit the resulting
    /// chunk into `owner`'s slot for this builder's target index.
    pub fn close<S: ChunkStore>(mut self, store: &S, owner: &ColumnBuilder) -> Result<()> {
        let array: Arc<dyn arrow::array::Array> = match &mut self.values {
            ValuesBuilder::Numeric(b) => Arc::new(b.finish()),
            ValuesBuilder::Integer(b) => Arc::new(b.finish()),
            ValuesBuilder::Codes(b) => Arc::new(b.finish()),
        };
        let bytes = serialize_chunk(array.as_ref())?;
        let key = store.alloc_one()?;
        let byte_len = bytes.len() as u64;
        store.batch_put(&[BatchPut::Raw { key, bytes }])?;
        owner.commit(
            self.target_chunk,
            SealedChunk {
                key,
                rows: self.rows,
                bytes: byte_len,
            },
        )
    }
}

#[derive(Debug)]
enum BuilderState {
    Open { slots: Vec<Option<SealedChunk>> },
    Closed,
}

/// A write-only column under construction: one slot per input chunk index,
/// each filled by exactly one committed [`ChunkBuilder`].
///
/// Slots are written by disjoint per-chunk workers; the mutex serializes the
/// slot commits themselves, not the data writes, which happen in the workers'
/// private chunk builders.
#[derive(Debug)]
pub struct ColumnBuilder {
    id: BuilderId,
    ty: ColumnType,
    state: Mutex<BuilderState>,
}

impl ColumnBuilder {
    /// `ty` carries the categorical dictionary, copied from the reference
    /// input column at allocation time so codes written through this builder
    /// stay valid in the closed column.
    pub fn new(id: BuilderId, ty: ColumnType, n_chunks: usize) -> Self {
        Self {
            id,
            ty,
            state: Mutex::new(BuilderState::Open {
                slots: vec![None; n_chunks],
            }),
        }
    }

    pub fn id(&self) -> BuilderId {
        self.id
    }

    pub fn ty(&self) -> &ColumnType {
        &self.ty
    }

    /// Start a chunk builder for `target_chunk` of this column.
    pub fn new_chunk(&self, target_chunk: usize) -> ChunkBuilder {
        ChunkBuilder::new(&self.ty, target_chunk)
    }

    /// Commit a sealed chunk into the slot for `chunk_idx`. Exactly one
    /// commit per index; a second commit, an out-of-range index, or a commit
    /// after close is a programming error.
    pub fn commit(&self, chunk_idx: usize, sealed: SealedChunk) -> Result<()> {
        let mut state = self.state.lock().expect("ColumnBuilder state lock poisoned");
        match &mut *state {
            BuilderState::Closed => Err(Error::Internal(format!(
                "commit to closed column builder {}",
                self.id
            ))),
            BuilderState::Open { slots } => {
                let slot = slots.get_mut(chunk_idx).ok_or_else(|| {
                    Error::Internal(format!(
                        "chunk index {chunk_idx} out of range for column builder {}",
                        self.id
                    ))
                })?;
                if slot.is_some() {
                    return Err(Error::Internal(format!(
                        "chunk {chunk_idx} of column builder {} committed twice",
                        self.id
                    )));
                }
                *slot = Some(sealed);
                Ok(())
            }
        }
    }

    /// Number of slots still awaiting a commit. Zero means ready to close.
    pub fn pending_chunks(&self) -> usize {
        match &*self.state.lock().expect("ColumnBuilder state lock poisoned") {
            BuilderState::Open { slots } => slots.iter().filter(|s| s.is_none()).count(),
            BuilderState::Closed => 0,
        }
    }

    /// Freeze into an immutable [`Column`].
    ///
    /// Must be called exactly once, after all parallel writers have finished;
    /// the caller guarantees single-call semantics by construction (one
    /// orchestrator closes after the distributed task completes). Closing
    /// twice or with unfilled slots fails fast.
    pub fn close<S: ChunkStore>(&self, store: &S) -> Result<Column> {
        let mut state = self.state.lock().expect("ColumnBuilder state lock poisoned");
        let slots = match &mut *state {
            BuilderState::Closed => {
                return Err(Error::Internal(format!(
                    "column builder {} closed twice",
                    self.id
                )));
            }
            BuilderState::Open { slots } => {
                let missing = slots.iter().filter(|s| s.is_none()).count();
                if missing > 0 {
                    return Err(Error::Internal(format!(
                        "column builder {} closed with {missing} unfilled chunk slots",
                        self.id
                    )));
                }
                std::mem::take(slots)
            }
        };
        *state = BuilderState::Closed;
        drop(state);

        let mut sizes = Vec::with_capacity(slots.len());
        let mut chunk_keys = Vec::with_capacity(slots.len());
        let mut byte_size = 0u64;
        for sealed in slots.into_iter().flatten() {
            sizes.push(sealed.rows);
            chunk_keys.push(sealed.key);
            byte_size += sealed.bytes;
        }

        let group_id = store.alloc_one()?;
        let group = Arc::new(ColumnGroup::from_chunk_sizes(group_id, &sizes));
        tracing::debug!(
            builder = self.id,
            group = group_id,
            chunks = chunk_keys.len(),
            rows = group.total_rows(),
            "closed column builder"
        );
        Ok(Column::new(self.ty.clone(), group, chunk_keys, byte_size))
    }
}
