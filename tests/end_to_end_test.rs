//! End-to-end tests: database file -> store -> service -> output

mod common;

use chatstat::output::{get_formatter, profile_json};
use chatstat::service::ProfileService;
use chatstat_core::reducer::ProfileReducer;
use chatstat_core::types::{Record, UserId};
use chatstat_scheduler::{Scheduler, SchedulerConfig, StrategyKind};
use chatstat_store_json::JsonSessionStore;
use common::{store_of, uniform_dataset};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

/// Serialize records in the chat client's database layout
fn database_json(records: &[Record]) -> Value {
    let mut users = Map::new();
    for record in records {
        let sessions = users
            .entry(record.owner.as_str().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let contents: Vec<Value> = record
            .messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content, "tokens": m.tokens }))
            .collect();
        if let Value::Object(sessions) = sessions {
            sessions.insert(
                record.session_id.as_str().to_string(),
                json!({
                    "clientName": record.model_name.as_str(),
                    "tags": record.tags,
                    "totalPromptTokens": record.prompt_tokens,
                    "totalCompletionTokens": record.completion_tokens,
                    "temperature": record.temperature,
                    "timeCreated": record.created_at,
                    "timeLastOpen": record.last_opened_at,
                    "timeLastExit": record.last_exit_at,
                    "apiKey": "redacted",
                    "maxTokens": 8192,
                    "messages": { "contents": contents },
                }),
            );
        }
    }
    Value::Object(users)
}

async fn write_database(dir: &TempDir, records: &[Record]) -> PathBuf {
    let path = dir.path().join("db.json");
    let body = serde_json::to_string(&database_json(records)).unwrap();
    tokio::fs::write(&path, body).await.unwrap();
    path
}

fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerConfig::default().with_workers(Some(4))).unwrap()
}

#[tokio::test]
async fn test_file_store_matches_memory_store() {
    let dir = TempDir::new().unwrap();
    let records = uniform_dataset(400, 12);
    let path = write_database(&dir, &records).await;

    let file_service = ProfileService::new(
        Arc::new(JsonSessionStore::open(&path).await.unwrap()),
        scheduler(),
        ProfileReducer::default(),
    );
    let memory_service = ProfileService::new(
        Arc::new(store_of(records)),
        scheduler(),
        ProfileReducer::default(),
    );

    for user in [UserId::admin(), UserId::new("user3")] {
        let from_file = file_service
            .generate(&user, StrategyKind::WorkerPool)
            .await
            .unwrap();
        let from_memory = memory_service
            .generate(&user, StrategyKind::Serial)
            .await
            .unwrap();
        assert!(from_file.approx_eq(&from_memory, 1e-9), "{user}");
    }
}

#[tokio::test]
async fn test_profile_written_as_json() {
    let dir = TempDir::new().unwrap();
    let records = uniform_dataset(50, 3);
    let path = write_database(&dir, &records).await;

    let service = ProfileService::new(
        Arc::new(JsonSessionStore::open(&path).await.unwrap()),
        scheduler(),
        ProfileReducer::default(),
    );
    let admin = UserId::admin();
    let profile = service
        .generate(&admin, StrategyKind::DataParallel)
        .await
        .unwrap();

    let out = dir.path().join("profile.json");
    let body = serde_json::to_string_pretty(&profile_json(&admin, &profile)).unwrap();
    tokio::fs::write(&out, &body).await.unwrap();

    let written: Value = serde_json::from_str(&tokio::fs::read_to_string(&out).await.unwrap())
        .unwrap();
    assert_eq!(written["sessions"], 50);
    assert_eq!(written["userCount"], 3);
    assert_eq!(written["topWords"].as_array().unwrap().len(), 20);

    let printed: Value =
        serde_json::from_str(&get_formatter(true).format_profile(&admin, &profile)).unwrap();
    assert_eq!(printed, written);
}

fn run_cli(db: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_chatstat"))
        .arg("--db")
        .arg(db)
        .args(args)
        .env_remove("CHATSTAT_STRATEGY")
        .env_remove("CHATSTAT_WORKERS")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[tokio::test]
async fn test_binary_reports() {
    let dir = TempDir::new().unwrap();
    let records = uniform_dataset(30, 2);
    let path = write_database(&dir, &records).await;
    let out = dir.path().join("user0.json");

    let output = run_cli(
        &path,
        &["--json", "--output", out.to_str().unwrap(), "profile", "user0"],
    );
    assert!(output.status.success(), "{output:?}");
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["user"], "user0");
    assert_eq!(printed["sessions"], 15);
    assert!(printed.get("userCount").is_none());
    assert!(out.exists());

    let output = run_cli(&path, &["--json", "users"]);
    assert!(output.status.success());
    let users: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(users["users"].as_array().unwrap().len(), 2);

    let output = run_cli(&path, &["--json", "--workers", "2", "compare"]);
    assert!(output.status.success());
    let comparison: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(comparison["runs"].as_array().unwrap().len(), 3);

    let output = run_cli(&path, &["--json", "sessions", "user1"]);
    assert!(output.status.success());
    let listing: Value = serde_json::from_slice(&output.stdout).unwrap();
    let sessions = listing["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 15);
    assert!(sessions.iter().all(|s| s["user"] == "user1"));

    let output = run_cli(&path, &["sessions", "user1"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Sessions of user1 (15)"));

    let output = run_cli(&path, &["profile", "nobody"]);
    assert!(!output.status.success());
}
