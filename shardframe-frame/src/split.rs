//! Stratified random split: partition a frame's rows into N output frames
//! in one chunk-parallel pass.
//!
//! The split is explicitly non-deterministic: one fresh uniform draw per row,
//! no seeding, so results differ across runs and retried chunks. Row counts
//! converge to the requested fractions in expectation only; small inputs get
//! what they get.

use crate::exec::{ChunkTask, run_over_chunks};
use crate::frame::Frame;
use rand::Rng;
use shardframe_column::{ChunkData, ColumnBuilder, ColumnType};
use shardframe_result::{Error, Result};
use shardframe_storage::ChunkStore;
use std::sync::Arc;

/// Cumulative split thresholds derived from caller fractions.
///
/// Fractions need not sum to 1, be sorted, or even be sane; the cumulative
/// sum plus a final threshold forced above 1.0 guarantees every draw in
/// [0, 1) lands in some output, tolerating malformed input instead of
/// rejecting it.
#[derive(Clone, Debug)]
pub struct SplitPlan {
    thresholds: Vec<f64>,
}

impl SplitPlan {
    pub fn new(fractions: &[f64]) -> Result<Self> {
        if fractions.is_empty() {
            return Err(Error::InvalidArgumentError(
                "split needs at least one fraction".to_string(),
            ));
        }
        let mut thresholds = Vec::with_capacity(fractions.len());
        let mut cumsum = 0.0;
        for &f in fractions {
            cumsum += f;
            thresholds.push(cumsum);
        }
        // Force the last boundary past 1.0 so every row is assigned
        // somewhere, even if the fractions passed in are garbage.
        *thresholds.last_mut().unwrap() = 1.01;
        Ok(Self { thresholds })
    }

    pub fn n_outputs(&self) -> usize {
        self.thresholds.len()
    }

    /// Output index for one uniform draw in [0, 1). Linear scan; the number
    /// of splits is small.
    pub fn pick(&self, draw: f64) -> usize {
        let mut split = 0;
        while draw > self.thresholds[split] {
            split += 1;
        }
        split
    }
}

/// The split computation, written against the chunk-task seam.
///
/// Setup allocates one column builder per (output, column) pair with
/// store-allocated cluster-unique identifiers; each map invocation writes a
/// disjoint chunk slot of every builder; finish closes the builders and
/// assembles the output frames.
pub struct FrameSplitter<'a, S: ChunkStore> {
    store: &'a S,
    plan: SplitPlan,
    names: Vec<String>,
    in_types: Vec<ColumnType>,
    /// `builders[output][column]`, allocated in setup.
    builders: Vec<Vec<Arc<ColumnBuilder>>>,
    outputs: Vec<Frame>,
}

impl<'a, S: ChunkStore> FrameSplitter<'a, S> {
    pub fn new(store: &'a S, frame: &Frame, plan: SplitPlan) -> Self {
        Self {
            store,
            plan,
            names: frame.names().to_vec(),
            // Cloning the type clones the categorical dictionary, which is
            // how output columns inherit the input's category labels.
            in_types: frame.handles().iter().map(|h| h.ty().clone()).collect(),
            builders: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// The assembled output frames; empty until `finish` has run.
    pub fn into_frames(self) -> Vec<Frame> {
        self.outputs
    }
}

impl<S: ChunkStore> ChunkTask for FrameSplitter<'_, S> {
    fn setup(&mut self, n_chunks: usize) -> Result<()> {
        let n_outputs = self.plan.n_outputs();
        let n_cols = self.in_types.len();
        let ids = self.store.alloc_many(n_outputs * n_cols)?;
        let mut ids = ids.into_iter();

        self.builders = (0..n_outputs)
            .map(|_| {
                self.in_types
                    .iter()
                    .map(|ty| {
                        Arc::new(ColumnBuilder::new(
                            ids.next().expect("allocated one id per builder"),
                            ty.clone(),
                            n_chunks,
                        ))
                    })
                    .collect()
            })
            .collect();
        tracing::debug!(
            outputs = n_outputs,
            columns = n_cols,
            n_chunks,
            "allocated split builders"
        );
        Ok(())
    }

    fn map(&self, chunk_idx: usize, chunks: &[ChunkData]) -> Result<()> {
        let mut rng = rand::rng();

        let mut out_chunks: Vec<Vec<_>> = self
            .builders
            .iter()
            .map(|row| row.iter().map(|b| b.new_chunk(chunk_idx)).collect())
            .collect();

        let rows = chunks.first().map(|c| c.len()).unwrap_or(0);
        for row in 0..rows {
            let draw: f64 = rng.random();
            let split = self.plan.pick(draw);
            for (column, chunk) in chunks.iter().enumerate() {
                // Missing stays missing; present values keep their kind.
                out_chunks[split][column].push(chunk.value(row))?;
            }
        }

        for (split, row) in out_chunks.into_iter().enumerate() {
            for (column, chunk) in row.into_iter().enumerate() {
                chunk.close(self.store, &self.builders[split][column])?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut outputs = Vec::with_capacity(self.builders.len());
        for row in &self.builders {
            let mut columns = Vec::with_capacity(row.len());
            for builder in row {
                columns.push(Arc::new(builder.close(self.store)?));
            }
            outputs.push(Frame::from_columns(self.names.clone(), columns)?);
        }
        self.outputs = outputs;
        Ok(())
    }
}

/// Split `frame`'s rows at random into `fractions.len()` output frames.
///
/// Does **not** promise an exact division; for small row counts you get what
/// you get. The output columns are freshly allocated; the caller owns their
/// removal.
pub fn split_frame<S: ChunkStore>(
    store: &S,
    frame: &Frame,
    fractions: &[f64],
) -> Result<Vec<Frame>> {
    let plan = SplitPlan::new(fractions)?;
    let mut task = FrameSplitter::new(store, frame, plan);
    run_over_chunks(store, frame, &mut task)?;
    Ok(task.into_frames())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_cumulative_with_forced_final_boundary() {
        let plan = SplitPlan::new(&[0.5, 0.3, 0.2]).unwrap();
        assert_eq!(plan.n_outputs(), 3);
        assert_eq!(plan.pick(0.0), 0);
        assert_eq!(plan.pick(0.49), 0);
        assert_eq!(plan.pick(0.51), 1);
        assert_eq!(plan.pick(0.99), 2);
    }

    #[test]
    fn garbage_fractions_still_cover_every_draw() {
        // Sums to well under 1; the forced final boundary absorbs the rest.
        let plan = SplitPlan::new(&[0.1, 0.1]).unwrap();
        assert_eq!(plan.pick(0.05), 0);
        assert_eq!(plan.pick(0.5), 1);
        assert_eq!(plan.pick(0.9999), 1);
    }

    #[test]
    fn zero_fractions_are_rejected() {
        assert!(SplitPlan::new(&[]).is_err());
    }
}
