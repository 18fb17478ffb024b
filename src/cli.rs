//! CLI interface for chatstat
//!
//! This module defines the command-line interface using clap. Global flags
//! select the database, the scheduling strategy and its tuning, and the
//! output format; subcommands pick the report.
//!
//! # Example
//!
//! ```bash
//! # Profile of every user, computed on the worker pool
//! chatstat profile
//!
//! # One user's profile as JSON, also written to a file
//! chatstat --json --output alice.json profile alice
//!
//! # Time all strategies on the same data with 8 workers
//! chatstat --workers 8 compare
//!
//! # List the stored sessions of one user
//! chatstat sessions alice
//! ```

use chatstat_core::error::{ChatstatError, Result};
use chatstat_core::reducer::TopKLimits;
use chatstat_core::types::{ADMIN_USER, UserId};
use chatstat_scheduler::{SchedulerConfig, StrategyKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aggregate usage profiles over chat-session records
#[derive(Parser, Debug, Clone)]
#[command(name = "chatstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Session database file (defaults to the discovered db.json)
    #[arg(long, env = "CHATSTAT_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Scheduling strategy: serial, data-parallel, or worker-pool
    #[arg(long, env = "CHATSTAT_STRATEGY", default_value_t = StrategyKind::WorkerPool, global = true)]
    pub strategy: StrategyKind,

    /// Worker threads for the parallel strategies (defaults to the number of CPUs)
    #[arg(long, env = "CHATSTAT_WORKERS", global = true)]
    pub workers: Option<usize>,

    /// Records per task pulled by a worker-pool thread
    #[arg(long, default_value_t = 4, global = true)]
    pub batch_size: usize,

    /// Inputs smaller than this are not split by the data-parallel strategy
    #[arg(long, default_value_t = 64, global = true)]
    pub min_chunk_size: usize,

    /// Number of most frequent words to report
    #[arg(long, default_value_t = 20, global = true)]
    pub top_words: usize,

    /// File of stop words, one per line (replaces the built-in English list)
    #[arg(long, global = true)]
    pub stop_words: Option<PathBuf>,

    /// Also write the profile as pretty-printed JSON to this file
    #[arg(long, short = 'o', global = true)]
    pub output: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available reports
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the profile of one user, or of everyone as "admin"
    Profile {
        /// User name
        #[arg(default_value = ADMIN_USER)]
        user: String,
    },

    /// List users and their session counts
    Users,

    /// List the stored sessions of one user, or of everyone as "admin"
    Sessions {
        /// User name
        #[arg(default_value = ADMIN_USER)]
        user: String,
    },

    /// Run every strategy on the same sessions and compare timings
    Compare {
        /// User name
        #[arg(default_value = ADMIN_USER)]
        user: String,
    },
}

impl Command {
    /// The user a report is about, if it is about one
    pub fn user(&self) -> Option<UserId> {
        match self {
            Command::Profile { user } | Command::Compare { user } | Command::Sessions { user } => {
                Some(UserId::new(user))
            }
            Command::Users => None,
        }
    }
}

impl Cli {
    /// Scheduler settings from the command line
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::default()
            .with_workers(self.workers)
            .with_batch_size(self.batch_size)
            .with_min_chunk_size(self.min_chunk_size)
    }

    /// Top-K limits from the command line
    pub fn top_k_limits(&self) -> TopKLimits {
        TopKLimits {
            words: self.top_words,
            ..TopKLimits::default()
        }
    }

    /// Reject option combinations clap cannot check on its own
    pub fn validate(&self) -> Result<()> {
        self.scheduler_config().validate()?;
        if self.output.is_some() && !matches!(self.command, Command::Profile { .. }) {
            return Err(ChatstatError::InvalidArgument(
                "--output is only supported by the profile command".to_string(),
            ));
        }
        if self.command.user().is_some_and(|u| u.as_str().is_empty()) {
            return Err(ChatstatError::InvalidArgument(
                "user name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
