//! Storage interface consumed by the shardframe core.
//!
//! The cluster-wide key-value store that durably maps chunk identifiers to
//! their physical bytes is an external collaborator; this crate defines the
//! trait the core programs against plus an in-memory implementation used by
//! tests and single-process runs.

pub mod pending;
pub mod store;
pub mod types;

pub use pending::Pending;
pub use store::{BatchGet, BatchPut, ChunkStore, GetResult, MemStore};
pub use types::ChunkKey;
