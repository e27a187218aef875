use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all shardframe operations.
///
/// Errors propagate upward with the `?` operator. Internal code matches on
/// specific variants where the failure mode matters (compatibility checks,
/// builder lifecycle violations); API boundaries render the message.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure while talking to a chunk store backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow failure while building, encoding, or decoding chunk data.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Invalid user input or API parameter (bad column index, empty frame
    /// where a readable column is required, mismatched name/column lists).
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Chunk key or identifier not present in the store.
    #[error("Storage key not found")]
    NotFound,

    /// Two columns of one frame disagree on chunk layout.
    ///
    /// `what` names the disagreeing quantity ("chunk count" or
    /// "chunk start"); both conflicting values are carried so callers can
    /// report the exact divergence.
    #[error("columns have incompatible chunk layouts: {what} {expected} and {found}")]
    ChunkLayoutMismatch {
        what: &'static str,
        expected: u64,
        found: u64,
    },

    /// Violated internal invariant; indicates a bug in calling code
    /// (double-closing a builder, committing to an occupied chunk slot).
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Layout mismatch on chunk counts.
    #[inline]
    pub fn chunk_count_mismatch(expected: u64, found: u64) -> Self {
        Error::ChunkLayoutMismatch {
            what: "chunk count",
            expected,
            found,
        }
    }

    /// Layout mismatch on the starting row offset of one chunk.
    #[inline]
    pub fn chunk_start_mismatch(expected: u64, found: u64) -> Self {
        Error::ChunkLayoutMismatch {
            what: "chunk start",
            expected,
            found,
        }
    }
}
