//! The chunk-parallel task seam.
//!
//! The cluster scheduler that dispatches a per-chunk function across the
//! shards hosting each chunk is an external collaborator; [`ChunkTask`] is
//! the interface tasks are written against, and [`run_over_chunks`] is the
//! local driver standing in for the scheduler: setup once, map every chunk
//! in parallel, full barrier, finish once.

use crate::frame::Frame;
use shardframe_column::ChunkData;
use shardframe_result::{Error, Result};
use shardframe_storage::ChunkStore;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A computation run once per chunk across a frame's aligned columns.
///
/// `setup` runs exactly once before any `map`; its effects are visible to
/// every `map` invocation. `map` runs once per chunk index, concurrently,
/// and must share no mutable state across invocations beyond disjoint
/// per-chunk builder slots. `finish` runs exactly once after every `map` has
/// completed; it is never called if any `map` failed.
pub trait ChunkTask: Send + Sync {
    fn setup(&mut self, n_chunks: usize) -> Result<()>;

    /// `chunks` holds the decoded chunk at `chunk_idx` for each input
    /// column, in frame column order.
    fn map(&self, chunk_idx: usize, chunks: &[ChunkData]) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Drive `task` over every chunk of `frame`.
///
/// Fails without calling `finish` if any per-chunk invocation fails, so a
/// task's partially written builders are abandoned rather than closed.
pub fn run_over_chunks<S: ChunkStore, T: ChunkTask>(
    store: &S,
    frame: &Frame,
    task: &mut T,
) -> Result<()> {
    frame.check_compatible()?;
    if frame.has_builders() {
        return Err(Error::InvalidArgumentError(
            "cannot run over chunks of a frame with open builders".to_string(),
        ));
    }
    let reference = frame.any_column().ok_or_else(|| {
        Error::InvalidArgumentError("frame has no readable column to iterate".to_string())
    })?;
    let n_chunks = reference.n_chunks();

    task.setup(n_chunks)?;

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(n_chunks.max(1));
    tracing::debug!(n_chunks, workers, "running chunk task");

    let cursor = AtomicUsize::new(0);
    let (err_tx, err_rx) = crossbeam_channel::unbounded::<Error>();
    let shared: &T = task;

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let err_tx = err_tx.clone();
            let cursor = &cursor;
            scope.spawn(move || {
                loop {
                    let idx = cursor.fetch_add(1, Ordering::Relaxed);
                    if idx >= n_chunks {
                        break;
                    }
                    let step = (|| -> Result<()> {
                        let mut chunks = Vec::with_capacity(frame.n_cols());
                        for handle in frame.handles() {
                            // has_builders was checked above; every handle
                            // is readable here.
                            let col = handle.as_ready().ok_or_else(|| {
                                Error::Internal("builder column in readable frame".to_string())
                            })?;
                            chunks.push(col.chunk(store, idx)?);
                        }
                        shared.map(idx, &chunks)
                    })();
                    if let Err(e) = step {
                        let _ = err_tx.send(e);
                        break;
                    }
                }
            });
        }
    });
    drop(err_tx);

    if let Ok(e) = err_rx.try_recv() {
        tracing::debug!("chunk task failed; finish will not run");
        return Err(e);
    }
    task.finish()
}
