//! Single-writer ingest convenience: build a finalized column from a value
//! slice, chunked at a fixed row count. Test setup and local loaders use
//! this; the distributed write path goes through the builders directly.

use crate::builder::ColumnBuilder;
use crate::chunk::{ColumnType, Value};
use crate::column::Column;
use shardframe_result::Result;
use shardframe_storage::ChunkStore;

/// Build a column from `values`, split into chunks of `rows_per_chunk`.
///
/// An empty `values` slice still produces one (empty) chunk so the column has
/// a well-formed layout.
pub fn build_column<S: ChunkStore>(
    store: &S,
    ty: ColumnType,
    values: &[Value],
    rows_per_chunk: usize,
) -> Result<Column> {
    if rows_per_chunk == 0 {
        return Err(shardframe_result::Error::InvalidArgumentError(
            "rows_per_chunk must be positive".to_string(),
        ));
    }
    let n_chunks = values.len().div_ceil(rows_per_chunk).max(1);
    let builder = ColumnBuilder::new(store.alloc_one()?, ty, n_chunks);

    for cidx in 0..n_chunks {
        let lo = cidx * rows_per_chunk;
        let hi = (lo + rows_per_chunk).min(values.len());
        let mut chunk = builder.new_chunk(cidx);
        for &v in &values[lo.min(values.len())..hi] {
            chunk.push(v)?;
        }
        chunk.close(store, &builder)?;
    }
    builder.close(store)
}
