//! Execution strategies for chatstat reducers
//!
//! Every strategy folds a slice of records with a [`Reducer`] and returns
//! the finished accumulator. The strategies differ only in how they split
//! and schedule the work:
//!
//! - [`Serial`]: one in-order fold on the calling thread
//! - [`DataParallel`]: one contiguous chunk per worker on the rayon pool
//! - [`WorkerPool`]: a dedicated pool whose workers pull small batches
//!   until the input is drained
//!
//! Because `combine` is associative and commutative, all three produce the
//! same finished result for the same input.
//!
//! [`Reducer`]: chatstat_core::Reducer

pub mod config;
pub mod data_parallel;
pub mod serial;
pub mod strategy;
pub mod worker_pool;

pub use config::SchedulerConfig;
pub use data_parallel::DataParallel;
pub use serial::Serial;
pub use strategy::{Scheduler, Strategy, StrategyKind};
pub use worker_pool::WorkerPool;
