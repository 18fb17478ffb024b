//! chatstat - Aggregate usage profiles over chat-session records

use chatstat::{
    cli::{Cli, Command},
    output::{get_formatter, profile_json},
    service::ProfileService,
};
use chatstat_core::error::Result;
use chatstat_core::reducer::ProfileReducer;
use chatstat_core::tokenizer::StopWords;
use chatstat_core::types::UserId;
use chatstat_scheduler::Scheduler;
use chatstat_store_json::JsonSessionStore;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Write the JSON form of a profile to `path`
async fn write_profile(path: &Path, user: &UserId, profile: &chatstat::Profile) -> Result<()> {
    let body = serde_json::to_string_pretty(&profile_json(user, profile))?;
    tokio::fs::write(path, body).await?;
    info!("Wrote profile of {} to {}", user, path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. The --verbose flag overrides RUST_LOG.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("chatstat=info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chatstat=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !is_terminal::is_terminal(std::io::stdout()) {
        colored::control::set_override(false);
    }

    cli.validate()?;

    let stop_words = match &cli.stop_words {
        Some(path) => StopWords::from_file(path)?,
        None => StopWords::english().clone(),
    };
    let reducer = ProfileReducer::new(Arc::new(stop_words), cli.top_k_limits());
    let scheduler = Scheduler::new(cli.scheduler_config())?;

    let store = match &cli.db {
        Some(path) => JsonSessionStore::open(path).await?,
        None => JsonSessionStore::discover().await?,
    };
    info!(
        "Using database {} ({} users, {} sessions)",
        store.path().display(),
        store.user_count(),
        store.record_count()
    );

    let service = ProfileService::new(Arc::new(store), scheduler, reducer);
    let formatter = get_formatter(cli.json);

    // Handle commands
    match &cli.command {
        Command::Profile { user } => {
            let user = UserId::new(user);
            info!("Generating profile of {} with {}", user, cli.strategy);

            let profile = service.generate(&user, cli.strategy).await?;
            println!("{}", formatter.format_profile(&user, &profile));

            if let Some(path) = &cli.output {
                write_profile(path, &user, &profile).await?;
            }
        }
        Command::Users => {
            let users = service.user_sessions().await?;
            println!("{}", formatter.format_users(&users));
        }
        Command::Sessions { user } => {
            let user = UserId::new(user);
            let sessions = service.sessions(&user).await?;
            println!("{}", formatter.format_sessions(&user, &sessions));
        }
        Command::Compare { user } => {
            let user = UserId::new(user);
            info!("Comparing strategies on the sessions of {}", user);

            let runs = service.compare(&user).await?;
            println!("{}", formatter.format_comparison(&user, &runs));
        }
    }

    Ok(())
}
