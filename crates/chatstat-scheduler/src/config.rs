//! Scheduler configuration

use chatstat_core::error::{ChatstatError, Result};
use serde::{Deserialize, Serialize};

/// Tuning knobs shared by the parallel strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker threads; `None` uses the available hardware parallelism
    ///
    /// An explicit count is taken as given and may exceed the number of
    /// hardware threads. It still stays fixed for the whole run.
    pub workers: Option<usize>,
    /// Inputs shorter than this are folded as a single chunk
    pub min_chunk_size: usize,
    /// Records per task handed to a pool worker
    pub batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            min_chunk_size: 64,
            batch_size: 4,
        }
    }
}

impl SchedulerConfig {
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Self {
        self.min_chunk_size = min_chunk_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Reject zero-sized settings
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(ChatstatError::InvalidArgument(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.min_chunk_size == 0 {
            return Err(ChatstatError::InvalidArgument(
                "minimum chunk size must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ChatstatError::InvalidArgument(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured worker count, or the hardware parallelism when unset
    ///
    /// Never depends on the input size.
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
