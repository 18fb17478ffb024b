//! chatstat - Aggregate usage profiles over chat-session records
//!
//! This library provides functionality to:
//! - Load chat sessions from the chat client's JSON database
//! - Fold them into a profile of totals, extrema, averages, and top-K rankings
//! - Schedule the fold serially, as a fixed data-parallel split, or on a
//!   load-balancing worker pool, with identical results
//! - Render profiles and strategy comparisons as tables or JSON
//!
//! # Examples
//!
//! ```no_run
//! use chatstat::service::ProfileService;
//! use chatstat_core::{ProfileReducer, UserId};
//! use chatstat_scheduler::{Scheduler, SchedulerConfig, StrategyKind};
//! use chatstat_store_json::JsonSessionStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> chatstat::Result<()> {
//!     let store = Arc::new(JsonSessionStore::open("db.json").await?);
//!     let scheduler = Scheduler::new(SchedulerConfig::default())?;
//!     let service = ProfileService::new(store, scheduler, ProfileReducer::default());
//!
//!     let profile = service.generate(&UserId::admin(), StrategyKind::WorkerPool).await?;
//!     println!("{} sessions", profile.sessions);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod output;
pub mod service;

// Re-export commonly used types
pub use chatstat_core::error::{ChatstatError, Result};
pub use chatstat_core::{Profile, ProfileSummary, UserId};
pub use chatstat_scheduler::StrategyKind;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
