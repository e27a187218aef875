//! Chunk payload codec: one chunk is one single-column Arrow IPC stream.

use arrow::array::{Array, ArrayRef, make_array};
use arrow::datatypes::{Field, Schema};
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use shardframe_result::{Error, Result};
use std::sync::Arc;

/// Serialize a single Arrow array into the bytes stored for one chunk.
pub fn serialize_chunk(array: &dyn Array) -> Result<Vec<u8>> {
    let schema = Schema::new(vec![Field::new(
        "chunk",
        array.data_type().clone(),
        array.is_nullable(),
    )]);
    let batch = RecordBatch::try_new(Arc::new(schema), vec![make_array(array.to_data())])?;
    let mut writer = StreamWriter::try_new(Vec::new(), &batch.schema())?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(writer.into_inner()?)
}

/// Deserialize stored chunk bytes back into an Arrow array.
pub fn deserialize_chunk(bytes: &[u8]) -> Result<ArrayRef> {
    let mut reader = StreamReader::try_new(bytes, None)?;
    let batch = reader
        .next()
        .ok_or_else(|| Error::Internal("serialized chunk stream is empty".to_string()))??;
    if batch.num_columns() != 1 {
        return Err(Error::Internal(
            "serialized chunk must hold exactly one array".to_string(),
        ));
    }
    Ok(batch.column(0).clone())
}
