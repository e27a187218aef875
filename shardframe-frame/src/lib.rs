//! Frames: lightweight, cheaply copied handles naming a set of independently
//! stored columns.
//!
//! Multiple frames may reference the same columns; excluding a column from a
//! computation means building a new frame over the remaining handles, never
//! copying data. The crate also carries the chunk-parallel task seam
//! ([`exec::ChunkTask`]) and the canonical cluster-parallel transform written
//! against it, the stratified random split ([`split`]).

pub mod csv;
pub mod exec;
pub mod frame;
pub mod split;

pub use csv::{CsvStream, CsvWriteOptions};
pub use exec::{ChunkTask, run_over_chunks};
pub use frame::{ColumnHandle, Frame};
pub use shardframe_result::{Error, Result};
pub use split::{FrameSplitter, SplitPlan, split_frame};
