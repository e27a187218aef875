//! Shared chunk-layout descriptor.

use crate::types::GroupId;

/// The chunk-boundary layout shared by every column created in one pass.
///
/// `starts[i]` is the global row offset at which chunk `i` begins;
/// `starts[0] == 0` and offsets are monotonically non-decreasing. Two columns
/// are row-aligned iff they hold the same group layout: chunk `i` of each
/// covers exactly the same row range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnGroup {
    id: GroupId,
    starts: Vec<u64>,
    total_rows: u64,
}

impl ColumnGroup {
    /// Build a group from per-chunk row counts, in chunk-index order.
    pub fn from_chunk_sizes(id: GroupId, sizes: &[u64]) -> Self {
        let mut starts = Vec::with_capacity(sizes.len());
        let mut offset = 0u64;
        for &size in sizes {
            starts.push(offset);
            offset += size;
        }
        Self {
            id,
            starts,
            total_rows: offset,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn n_chunks(&self) -> usize {
        self.starts.len()
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Global row offset at which chunk `idx` begins.
    pub fn chunk_start(&self, idx: usize) -> u64 {
        self.starts[idx]
    }

    /// Row count of chunk `idx`.
    pub fn chunk_rows(&self, idx: usize) -> u64 {
        let end = match self.starts.get(idx + 1) {
            Some(&next) => next,
            None => self.total_rows,
        };
        end - self.starts[idx]
    }

    /// Index of the chunk containing global row `row`.
    ///
    /// Caller must keep `row < total_rows`.
    pub fn chunk_of_row(&self, row: u64) -> usize {
        debug_assert!(row < self.total_rows);
        self.starts.partition_point(|&s| s <= row) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_cumulative() {
        let g = ColumnGroup::from_chunk_sizes(7, &[4, 0, 3]);
        assert_eq!(g.n_chunks(), 3);
        assert_eq!(g.total_rows(), 7);
        assert_eq!(g.chunk_start(0), 0);
        assert_eq!(g.chunk_start(1), 4);
        assert_eq!(g.chunk_start(2), 4);
        assert_eq!(g.chunk_rows(0), 4);
        assert_eq!(g.chunk_rows(1), 0);
        assert_eq!(g.chunk_rows(2), 3);
    }

    #[test]
    fn row_to_chunk_skips_empty_chunks() {
        let g = ColumnGroup::from_chunk_sizes(1, &[4, 0, 3]);
        assert_eq!(g.chunk_of_row(0), 0);
        assert_eq!(g.chunk_of_row(3), 0);
        assert_eq!(g.chunk_of_row(4), 2);
        assert_eq!(g.chunk_of_row(6), 2);
    }
}
