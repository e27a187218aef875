//! Minimal chunk-store trait + in-memory implementation returning `Bytes`
//! blobs. Returning `bytes::Bytes` lets readers build Arrow buffers that
//! borrow the store memory with zero copying.

use crate::pending::Pending;
use crate::types::ChunkKey;
use bytes::Bytes;
use rustc_hash::FxHashMap;
use shardframe_result::{Error, Result};
use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};

/// Key 0 is reserved so freshly allocated keys are always non-zero and a zero
/// key can be used as "none" in fixed-layout metadata.
pub const RESERVED_NULL_KEY: ChunkKey = 0;

#[derive(Clone, Debug)]
pub enum BatchPut {
    Raw { key: ChunkKey, bytes: Vec<u8> },
}

#[derive(Clone, Debug)]
pub enum BatchGet {
    Raw { key: ChunkKey },
}

#[derive(Clone, Debug)]
pub enum GetResult<B> {
    Raw { key: ChunkKey, bytes: B },
    Missing { key: ChunkKey },
}

/// Distributed key-value store interface the frame core consumes.
///
/// `alloc_many` doubles as the cluster-wide identifier-allocation service:
/// builder, group, and chunk identifiers are all drawn from the same
/// monotonic key space, so an injected store gives tests deterministic ids.
pub trait ChunkStore: Send + Sync + 'static {
    type Blob: AsRef<[u8]> + Clone + Send + Sync + 'static;

    /// Allocate `n` new cluster-unique keys.
    fn alloc_many(&self, n: usize) -> Result<Vec<ChunkKey>>;

    /// Batch get blobs; returns one `GetResult` per request in order.
    fn batch_get(&self, gets: &[BatchGet]) -> Result<Vec<GetResult<Self::Blob>>>;

    /// Batch put blobs at fixed keys.
    fn batch_put(&self, puts: &[BatchPut]) -> Result<()>;

    /// Batch free keys. Removal is asynchronous: implementations register a
    /// completion with `pending` and may return before the bytes are gone.
    /// Unknown keys are ignored.
    fn free_many(&self, keys: &[ChunkKey], pending: &Pending) -> Result<()>;

    /// Allocate a single key.
    fn alloc_one(&self) -> Result<ChunkKey> {
        Ok(self.alloc_many(1)?[0])
    }
}

/// In-memory store used for tests, benchmarks, and single-process runs.
#[allow(clippy::module_name_repetitions)]
pub struct MemStore {
    next_key: AtomicU64,
    blobs: RwLock<FxHashMap<ChunkKey, Bytes>>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            next_key: AtomicU64::new(RESERVED_NULL_KEY + 1),
            blobs: RwLock::new(FxHashMap::default()),
        }
    }

    /// Number of blobs currently stored. Test aid.
    pub fn blob_count(&self) -> usize {
        self.blobs.read().expect("MemStore blobs lock poisoned").len()
    }
}

impl ChunkStore for MemStore {
    type Blob = Bytes;

    fn alloc_many(&self, n: usize) -> Result<Vec<ChunkKey>> {
        let n_u64 = n as u64;
        let start = self
            .next_key
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                cur.checked_add(n_u64)
            })
            .map_err(|_| Error::Internal("chunk key space overflow".to_string()))?;
        Ok((start..start + n_u64).collect())
    }

    fn batch_get(&self, gets: &[BatchGet]) -> Result<Vec<GetResult<Self::Blob>>> {
        let map = self.blobs.read().expect("MemStore blobs lock poisoned");
        let mut out = Vec::with_capacity(gets.len());
        for g in gets {
            match *g {
                BatchGet::Raw { key } => {
                    if let Some(b) = map.get(&key) {
                        out.push(GetResult::Raw {
                            key,
                            bytes: b.clone(),
                        });
                    } else {
                        out.push(GetResult::Missing { key });
                    }
                }
            }
        }
        Ok(out)
    }

    fn batch_put(&self, puts: &[BatchPut]) -> Result<()> {
        let mut map = self.blobs.write().expect("MemStore blobs lock poisoned");
        for p in puts {
            match p {
                BatchPut::Raw { key, bytes } => {
                    map.insert(*key, Bytes::from(bytes.clone()));
                }
            }
        }
        Ok(())
    }

    fn free_many(&self, keys: &[ChunkKey], pending: &Pending) -> Result<()> {
        // In-memory removal completes inline; the completion handle resolves
        // immediately so callers can still `wait()` uniformly.
        let (tx, rx) = crossbeam_channel::bounded(1);
        let res = {
            let mut map = self.blobs.write().expect("MemStore blobs lock poisoned");
            for &k in keys {
                map.remove(&k);
            }
            Ok(())
        };
        let _ = tx.send(res);
        pending.defer(rx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_monotonic_and_unique() {
        let store = MemStore::new();
        let a = store.alloc_many(3).unwrap();
        let b = store.alloc_many(2).unwrap();
        assert_eq!(a, vec![1, 2, 3]);
        assert_eq!(b, vec![4, 5]);
    }

    #[test]
    fn put_get_free_round_trip() {
        let store = MemStore::new();
        let key = store.alloc_one().unwrap();
        store
            .batch_put(&[BatchPut::Raw {
                key,
                bytes: vec![1, 2, 3],
            }])
            .unwrap();

        match &store.batch_get(&[BatchGet::Raw { key }]).unwrap()[0] {
            GetResult::Raw { bytes, .. } => assert_eq!(bytes.as_ref(), &[1, 2, 3]),
            GetResult::Missing { .. } => panic!("blob should exist"),
        }

        let pending = Pending::new();
        store.free_many(&[key], &pending).unwrap();
        pending.wait().unwrap();
        assert!(matches!(
            store.batch_get(&[BatchGet::Raw { key }]).unwrap()[0],
            GetResult::Missing { .. }
        ));
    }
}
