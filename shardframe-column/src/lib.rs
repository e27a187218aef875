//! Column model for shardframe: immutable, chunked, typed sequences plus the
//! write-side builders used by parallel workers to populate new columns.
//!
//! A [`Column`] is finalized and read-only; its chunk layout is owned by a
//! [`ColumnGroup`] shared with every column created in the same pass, which is
//! what makes a set of columns row-aligned. [`ColumnBuilder`] and
//! [`ChunkBuilder`] are the pre-finalization counterparts: many workers append
//! into disjoint per-chunk slots, then a single orchestrator closes the
//! builder into a `Column`.

pub mod builder;
pub mod chunk;
pub mod column;
pub mod group;
pub mod ingest;
pub mod serde;
pub mod types;

pub use builder::{ChunkBuilder, ColumnBuilder, SealedChunk};
pub use chunk::{ChunkData, ColumnType, Value};
pub use column::Column;
pub use group::ColumnGroup;
pub use ingest::build_column;
pub use shardframe_result::{Error, Result};
pub use types::{BuilderId, GroupId};
