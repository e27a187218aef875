//! Completion handles for deferred store operations.

use crossbeam_channel::Receiver;
use shardframe_result::{Error, Result};
use std::sync::Mutex;

/// A set of in-flight completions for asynchronous removals.
///
/// Callers hand a `Pending` to [`crate::ChunkStore::free_many`], keep issuing
/// work, and `wait()` once at the end. Each registered receiver yields the
/// outcome of one deferred operation; `wait()` drains them all and surfaces
/// the first failure.
#[derive(Default)]
pub struct Pending {
    waits: Mutex<Vec<Receiver<Result<()>>>>,
}

impl Pending {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one deferred completion.
    pub fn defer(&self, rx: Receiver<Result<()>>) {
        self.waits
            .lock()
            .expect("Pending waits lock poisoned")
            .push(rx);
    }

    /// Block until every registered completion has resolved.
    pub fn wait(&self) -> Result<()> {
        let waits = std::mem::take(
            &mut *self.waits.lock().expect("Pending waits lock poisoned"),
        );
        let mut first_err = None;
        for rx in waits {
            match rx.recv() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(_) => {
                    first_err
                        .get_or_insert(Error::Internal("removal worker dropped".to_string()));
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
