//! Fixed fan-out divide-and-conquer strategy
//!
//! The input is cut into one contiguous chunk per worker, the chunks are
//! folded concurrently on the rayon global pool, and the partial results
//! are merged once every chunk has finished. Chunks of equal length can
//! still take very different amounts of time when a few records carry long
//! conversations; [`WorkerPool`](crate::WorkerPool) handles that case.

use crate::config::SchedulerConfig;
use crate::serial::fold_until_failed;
use crate::strategy::Strategy;
use chatstat_core::error::Result;
use chatstat_core::reducer::Reducer;
use chatstat_core::types::Record;
use rayon::prelude::*;
use std::sync::atomic::AtomicBool;
use tracing::debug;

/// One contiguous chunk per worker, merged after a barrier
#[derive(Debug, Clone, Copy)]
pub struct DataParallel {
    chunks: usize,
    min_chunk_size: usize,
}

impl Default for DataParallel {
    fn default() -> Self {
        Self::new(&SchedulerConfig::default())
    }
}

impl DataParallel {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            chunks: config.resolved_workers().max(1),
            min_chunk_size: config.min_chunk_size.max(1),
        }
    }

    /// Length of each chunk for an input of `len` records
    fn chunk_len(&self, len: usize) -> usize {
        if len < self.min_chunk_size {
            len.max(1)
        } else {
            len.div_ceil(self.chunks)
        }
    }
}

impl Strategy for DataParallel {
    fn name(&self) -> &'static str {
        "data-parallel"
    }

    fn run<R: Reducer>(&self, records: &[Record], reducer: &R) -> Result<R::Accumulator> {
        if records.is_empty() {
            return Ok(reducer.finish(reducer.identity()));
        }

        let chunk_len = self.chunk_len(records.len());
        debug!(
            "Folding {} records in {} chunks of up to {}",
            records.len(),
            records.len().div_ceil(chunk_len),
            chunk_len
        );

        let failed = AtomicBool::new(false);
        let partials = records
            .par_chunks(chunk_len)
            .map(|chunk| fold_until_failed(chunk, reducer, &failed))
            .collect::<Result<Vec<_>>>()?;

        let merged = partials
            .into_iter()
            .reduce(|a, b| reducer.combine(a, b))
            .unwrap_or_else(|| reducer.identity());
        Ok(reducer.finish(merged))
    }
}
