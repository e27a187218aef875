use shardframe_column::{ColumnType, Value, build_column};
use shardframe_frame::{CsvWriteOptions, Frame};
use shardframe_storage::MemStore;
use std::io::Read;
use std::sync::Arc;

fn sample_frame(store: &MemStore) -> Frame {
    let ages = [Value::Integer(34), Value::Missing, Value::Integer(51)];
    let risks = [Value::Code(0), Value::Code(1), Value::Missing];
    let domain: Arc<[String]> = ["low", "high"].iter().map(|s| s.to_string()).collect();

    let mut frame = Frame::default();
    frame.add(
        "age",
        build_column(store, ColumnType::Integer, &ages, 2).unwrap(),
    );
    frame.add(
        "risk",
        build_column(store, ColumnType::Categorical(domain), &risks, 2).unwrap(),
    );
    frame
}

fn read_all(frame: &Frame, store: &MemStore, options: &CsvWriteOptions) -> String {
    let mut stream = frame.to_csv(store, options).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

#[test]
fn export_with_header_yields_one_line_per_row_plus_header() {
    let store = MemStore::new();
    let frame = sample_frame(&store);
    let out = read_all(&frame, &store, &CsvWriteOptions::default());

    let lines: Vec<&str> = out.split_terminator('\n').collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "\"age\",\"risk\"");
    assert_eq!(lines[1], "34,\"low\"");
    assert_eq!(lines[2], ",\"high\"");
    assert_eq!(lines[3], "51,");
    // Newline-terminated, nothing after the last row.
    assert!(out.ends_with("51,\n"));
}

#[test]
fn export_without_header_starts_at_the_first_row() {
    let store = MemStore::new();
    let frame = sample_frame(&store);
    let out = read_all(
        &frame,
        &store,
        &CsvWriteOptions {
            include_header: false,
            ..Default::default()
        },
    );
    assert_eq!(out.lines().count(), 3);
    assert!(out.starts_with("34,"));
}

#[test]
fn numeric_values_are_unquoted_and_missing_is_blank() {
    let store = MemStore::new();
    let values = [Value::Numeric(1.5), Value::Missing, Value::Numeric(-2.25)];
    let mut frame = Frame::default();
    frame.add(
        "x",
        build_column(&store, ColumnType::Numeric, &values, 3).unwrap(),
    );

    let out = read_all(&frame, &store, &CsvWriteOptions::default());
    assert_eq!(out, "\"x\"\n1.5\n\n-2.25\n");
}

#[test]
fn custom_delimiter_is_respected() {
    let store = MemStore::new();
    let frame = sample_frame(&store);
    let out = read_all(
        &frame,
        &store,
        &CsvWriteOptions {
            include_header: true,
            delimiter: b';',
        },
    );
    assert!(out.starts_with("\"age\";\"risk\"\n"));
    assert!(out.contains("34;\"low\""));
}

#[test]
fn small_read_buffers_reassemble_the_same_bytes() {
    let store = MemStore::new();
    let frame = sample_frame(&store);
    let whole = read_all(&frame, &store, &CsvWriteOptions::default());

    let mut stream = frame.to_csv(&store, &CsvWriteOptions::default()).unwrap();
    let mut byte_at_a_time = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        match stream.read(&mut buf).unwrap() {
            0 => break,
            n => byte_at_a_time.extend_from_slice(&buf[..n]),
        }
    }
    assert_eq!(String::from_utf8(byte_at_a_time).unwrap(), whole);
}
