//! Strategy selection

use crate::config::SchedulerConfig;
use crate::data_parallel::DataParallel;
use crate::serial::Serial;
use crate::worker_pool::WorkerPool;
use chatstat_core::error::{ChatstatError, Result};
use chatstat_core::reducer::Reducer;
use chatstat_core::types::Record;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

/// A way of scheduling a reduction over a slice of records
///
/// Every strategy returns a finished accumulator that is equal, up to
/// floating-point rounding, to what [`Serial`] returns for the same input.
pub trait Strategy {
    /// Short name used in logs and on the command line
    fn name(&self) -> &'static str;

    /// Reduce `records` and finish the result
    fn run<R: Reducer>(&self, records: &[Record], reducer: &R) -> Result<R::Accumulator>;
}

/// Selectable scheduling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Serial,
    DataParallel,
    #[default]
    WorkerPool,
}

impl StrategyKind {
    /// Every strategy, baseline first
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Serial,
        StrategyKind::DataParallel,
        StrategyKind::WorkerPool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Serial => "serial",
            StrategyKind::DataParallel => "data-parallel",
            StrategyKind::WorkerPool => "worker-pool",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ChatstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(StrategyKind::Serial),
            "data-parallel" | "data_parallel" | "dp" => Ok(StrategyKind::DataParallel),
            "worker-pool" | "worker_pool" | "pool" => Ok(StrategyKind::WorkerPool),
            other => Err(ChatstatError::InvalidArgument(format!(
                "unknown strategy '{other}' (expected serial, data-parallel or worker-pool)"
            ))),
        }
    }
}

/// Runs reductions with any [`StrategyKind`]
///
/// The worker pool is built on first use and then reused for every later
/// run, so a long-lived scheduler pays the thread start-up cost once.
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    data_parallel: DataParallel,
    pool: OnceCell<WorkerPool>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            data_parallel: DataParallel::new(&config),
            pool: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn worker_pool(&self) -> Result<&WorkerPool> {
        self.pool.get_or_try_init(|| WorkerPool::new(&self.config))
    }

    /// Reduce `records` with the strategy selected by `kind`
    pub fn run<R: Reducer>(
        &self,
        kind: StrategyKind,
        records: &[Record],
        reducer: &R,
    ) -> Result<R::Accumulator> {
        let start = Instant::now();
        let result = match kind {
            StrategyKind::Serial => Serial.run(records, reducer),
            StrategyKind::DataParallel => self.data_parallel.run(records, reducer),
            StrategyKind::WorkerPool => self.worker_pool()?.run(records, reducer),
        };
        debug!(
            "{} reduced {} records in {:?}",
            kind,
            records.len(),
            start.elapsed()
        );
        result
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            config: SchedulerConfig::default(),
            data_parallel: DataParallel::default(),
            pool: OnceCell::new(),
        }
    }
}
