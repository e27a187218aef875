//! Finalized, immutable columns.

use crate::chunk::{ChunkData, ColumnType, Value};
use crate::group::ColumnGroup;
use crate::serde::deserialize_chunk;
use shardframe_result::{Error, Result};
use shardframe_storage::{BatchGet, ChunkKey, ChunkStore, GetResult, Pending};
use std::sync::Arc;

/// An immutable, distributed sequence of typed values, physically divided
/// into an ordered sequence of chunks held in the chunk store.
///
/// Chunk count and per-chunk starting offsets are fixed at close time and
/// always equal the owning [`ColumnGroup`]'s layout. Chunk data is immutable,
/// so unlimited concurrent readers are safe.
#[derive(Clone, Debug)]
pub struct Column {
    ty: ColumnType,
    group: Arc<ColumnGroup>,
    chunk_keys: Vec<ChunkKey>,
    byte_size: u64,
}

impl Column {
    pub(crate) fn new(
        ty: ColumnType,
        group: Arc<ColumnGroup>,
        chunk_keys: Vec<ChunkKey>,
        byte_size: u64,
    ) -> Self {
        debug_assert_eq!(group.n_chunks(), chunk_keys.len());
        Self {
            ty,
            group,
            chunk_keys,
            byte_size,
        }
    }

    pub fn ty(&self) -> &ColumnType {
        &self.ty
    }

    /// Dictionary of category labels, present iff categorical.
    pub fn domain(&self) -> Option<&Arc<[String]>> {
        self.ty.domain()
    }

    pub fn group(&self) -> &Arc<ColumnGroup> {
        &self.group
    }

    /// Total row count.
    pub fn len(&self) -> u64 {
        self.group.total_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_chunks(&self) -> usize {
        self.group.n_chunks()
    }

    /// Global row offset at which chunk `idx` begins.
    pub fn chunk_start(&self, idx: usize) -> u64 {
        self.group.chunk_start(idx)
    }

    /// Sum of serialized chunk sizes, recorded at close time.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn chunk_keys(&self) -> &[ChunkKey] {
        &self.chunk_keys
    }

    /// Fetch and decode chunk `idx` from the store.
    pub fn chunk<S: ChunkStore>(&self, store: &S, idx: usize) -> Result<ChunkData> {
        let key = *self
            .chunk_keys
            .get(idx)
            .ok_or_else(|| Error::InvalidArgumentError(format!("chunk index {idx} out of range")))?;
        let blob = match store.batch_get(&[BatchGet::Raw { key }])?.pop() {
            Some(GetResult::Raw { bytes, .. }) => bytes,
            _ => return Err(Error::NotFound),
        };
        ChunkData::from_array(&self.ty, deserialize_chunk(blob.as_ref())?)
    }

    /// Read one value by global row index. Fetches the covering chunk; bulk
    /// readers should iterate chunks instead.
    pub fn value<S: ChunkStore>(&self, store: &S, row: u64) -> Result<Value> {
        if row >= self.len() {
            return Err(Error::InvalidArgumentError(format!(
                "row {row} out of range for column of {} rows",
                self.len()
            )));
        }
        let cidx = self.group.chunk_of_row(row);
        let chunk = self.chunk(store, cidx)?;
        Ok(chunk.value((row - self.group.chunk_start(cidx)) as usize))
    }

    pub fn is_missing<S: ChunkStore>(&self, store: &S, row: u64) -> Result<bool> {
        Ok(self.value(store, row)?.is_missing())
    }

    /// Release this column's chunks from the store. Removal is deferred;
    /// callers wait on `pending`. Other columns sharing the group layout are
    /// unaffected.
    pub fn release<S: ChunkStore>(&self, store: &S, pending: &Pending) -> Result<()> {
        tracing::debug!(
            group = self.group.id(),
            chunks = self.chunk_keys.len(),
            "releasing column chunks"
        );
        store.free_many(&self.chunk_keys, pending)
    }
}
