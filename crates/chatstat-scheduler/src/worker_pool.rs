//! Dynamic load-balancing strategy
//!
//! A fixed set of worker threads pulls small batches of records from a
//! shared cursor until the input is drained. A worker that lands on a batch
//! of long conversations simply claims fewer batches, so skewed inputs keep
//! every thread busy until the end. Each worker folds into a private
//! accumulator; the partial results are merged on the calling thread after
//! all workers have returned.

use crate::config::SchedulerConfig;
use crate::strategy::Strategy;
use chatstat_core::error::{ChatstatError, Result};
use chatstat_core::reducer::Reducer;
use chatstat_core::types::Record;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Fixed-size pool of workers pulling batches from a shared queue
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
    batch_size: usize,
}

impl WorkerPool {
    /// Start `config.resolved_workers()` threads
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        config.validate()?;
        let workers = config.resolved_workers();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("chatstat-worker-{i}"))
            .build()
            .map_err(|e| ChatstatError::Scheduler(format!("failed to start worker pool: {e}")))?;
        debug!("Started worker pool with {} threads", workers);
        Ok(Self {
            pool,
            batch_size: config.batch_size,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// What one worker produced
struct WorkerOutcome<A> {
    acc: A,
    batches: usize,
}

impl Strategy for WorkerPool {
    fn name(&self) -> &'static str {
        "worker-pool"
    }

    fn run<R: Reducer>(&self, records: &[Record], reducer: &R) -> Result<R::Accumulator> {
        let cursor = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        // Keeps the cursor far from usize::MAX however large the configured batch
        let batch_size = self.batch_size.min(records.len().max(1));

        let outcomes = self.pool.broadcast(|ctx| {
            let mut acc = reducer.identity();
            let mut batches = 0;
            while !failed.load(Ordering::Relaxed) {
                let start = cursor.fetch_add(batch_size, Ordering::Relaxed);
                if start >= records.len() {
                    break;
                }
                let end = (start + batch_size).min(records.len());
                for record in &records[start..end] {
                    if let Err(e) = reducer.accumulate(&mut acc, record) {
                        failed.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                }
                batches += 1;
            }
            debug!("Worker {} folded {} batches", ctx.index(), batches);
            Ok(WorkerOutcome { acc, batches })
        });

        let mut merged = reducer.identity();
        let mut total_batches = 0;
        for outcome in outcomes {
            let outcome: WorkerOutcome<R::Accumulator> = outcome?;
            total_batches += outcome.batches;
            merged = reducer.combine(merged, outcome.acc);
        }
        debug!(
            "Pool drained {} records in {} batches",
            records.len(),
            total_batches
        );
        Ok(reducer.finish(merged))
    }
}
