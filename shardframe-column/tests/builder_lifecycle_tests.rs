use shardframe_column::{ColumnBuilder, ColumnType, Value, build_column};
use shardframe_result::Error;
use shardframe_storage::{ChunkStore, MemStore};
use std::sync::Arc;

fn labels(names: &[&str]) -> Arc<[String]> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn close_derives_layout_from_committed_chunk_sizes() {
    let store = MemStore::new();
    let builder = ColumnBuilder::new(store.alloc_one().unwrap(), ColumnType::Integer, 3);

    // Commit out of index order; layout must still follow index order.
    for (cidx, rows) in [(2usize, 2i64), (0, 3), (1, 1)] {
        let mut chunk = builder.new_chunk(cidx);
        for v in 0..rows {
            chunk.push(Value::Integer(v)).unwrap();
        }
        chunk.close(&store, &builder).unwrap();
    }

    let col = builder.close(&store).unwrap();
    assert_eq!(col.n_chunks(), 3);
    assert_eq!(col.len(), 6);
    assert_eq!(col.chunk_start(0), 0);
    assert_eq!(col.chunk_start(1), 3);
    assert_eq!(col.chunk_start(2), 4);
    assert!(col.byte_size() > 0);
}

#[test]
fn close_with_unfilled_slots_fails_fast() {
    let store = MemStore::new();
    let builder = ColumnBuilder::new(store.alloc_one().unwrap(), ColumnType::Numeric, 2);

    let mut chunk = builder.new_chunk(0);
    chunk.push(Value::Numeric(1.5)).unwrap();
    chunk.close(&store, &builder).unwrap();

    assert_eq!(builder.pending_chunks(), 1);
    let err = builder.close(&store).unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[test]
fn double_close_fails_rather_than_silently_succeeding() {
    let store = MemStore::new();
    let builder = ColumnBuilder::new(store.alloc_one().unwrap(), ColumnType::Integer, 1);
    let mut chunk = builder.new_chunk(0);
    chunk.push(Value::Integer(42)).unwrap();
    chunk.close(&store, &builder).unwrap();

    builder.close(&store).unwrap();
    let err = builder.close(&store).unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[test]
fn committing_one_chunk_index_twice_is_rejected() {
    let store = MemStore::new();
    let builder = ColumnBuilder::new(store.alloc_one().unwrap(), ColumnType::Integer, 2);

    let mut first = builder.new_chunk(1);
    first.push(Value::Integer(1)).unwrap();
    first.close(&store, &builder).unwrap();

    let mut second = builder.new_chunk(1);
    second.push(Value::Integer(2)).unwrap();
    let err = second.close(&store, &builder).unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[test]
fn missing_values_survive_write_and_read() {
    let store = MemStore::new();
    let values = [
        Value::Numeric(1.0),
        Value::Missing,
        Value::Numeric(3.0),
        Value::Missing,
    ];
    let col = build_column(&store, ColumnType::Numeric, &values, 2).unwrap();

    assert_eq!(col.value(&store, 0).unwrap(), Value::Numeric(1.0));
    assert_eq!(col.value(&store, 1).unwrap(), Value::Missing);
    assert_eq!(col.value(&store, 2).unwrap(), Value::Numeric(3.0));
    assert!(col.is_missing(&store, 3).unwrap());
}

#[test]
fn categorical_column_carries_its_dictionary() {
    let store = MemStore::new();
    let domain = labels(&["low", "high"]);
    let values = [Value::Code(0), Value::Code(1), Value::Missing];
    let col = build_column(
        &store,
        ColumnType::Categorical(Arc::clone(&domain)),
        &values,
        2,
    )
    .unwrap();

    assert_eq!(col.domain().unwrap().as_ref(), domain.as_ref());
    assert_eq!(col.value(&store, 1).unwrap(), Value::Code(1));
}

#[test]
fn value_kind_mismatch_is_rejected_at_append() {
    let store = MemStore::new();
    let builder = ColumnBuilder::new(store.alloc_one().unwrap(), ColumnType::Integer, 1);
    let mut chunk = builder.new_chunk(0);
    let err = chunk.push(Value::Numeric(0.5)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgumentError(_)));
}

#[test]
fn empty_column_still_has_one_well_formed_chunk() {
    let store = MemStore::new();
    let col = build_column(&store, ColumnType::Integer, &[], 4).unwrap();
    assert_eq!(col.n_chunks(), 1);
    assert_eq!(col.len(), 0);
    assert!(col.value(&store, 0).is_err());
}

#[test]
fn release_frees_chunk_blobs_from_the_store() {
    let store = MemStore::new();
    let values = [Value::Integer(1), Value::Integer(2), Value::Integer(3)];
    let col = build_column(&store, ColumnType::Integer, &values, 2).unwrap();
    let before = store.blob_count();
    assert_eq!(before, col.n_chunks());

    let pending = shardframe_storage::Pending::new();
    col.release(&store, &pending).unwrap();
    pending.wait().unwrap();
    assert_eq!(store.blob_count(), 0);
}
