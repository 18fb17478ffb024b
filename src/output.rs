//! Output formatting module for chatstat
//!
//! This module provides formatters for displaying profiles in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```
//! use chatstat::output::get_formatter;
//! use chatstat_core::{Profile, ProfileReducer, Reducer, UserId};
//!
//! let reducer = ProfileReducer::default();
//! let profile = reducer.finish(reducer.identity());
//!
//! // Get table formatter for human-readable output
//! let formatter = get_formatter(false);
//! println!("{}", formatter.format_profile(&UserId::new("alice"), &profile));
//!
//! // Get JSON formatter for machine-readable output
//! let json_formatter = get_formatter(true);
//! println!("{}", json_formatter.format_profile(&UserId::new("alice"), &profile));
//! ```

use crate::service::StrategyRun;
use chatstat_core::frequency::RankedEntry;
use chatstat_core::profile::{Profile, ProfileSummary};
use chatstat_core::types::{Record, UserId};
use chrono::{DateTime, NaiveTime};
use colored::Colorize;
use prettytable::{Table, format, row};
use serde_json::{Value, json};
use std::borrow::Cow;

/// Trait for output formatters
///
/// Implementations can provide different output formats (table, JSON, CSV, etc.).
pub trait OutputFormatter {
    /// Format a finished profile
    fn format_profile(&self, user: &UserId, profile: &Profile) -> String;

    /// Format the user list with session counts
    fn format_users(&self, users: &[(UserId, usize)]) -> String;

    /// Format the stored sessions of a user
    fn format_sessions(&self, user: &UserId, sessions: &[Record]) -> String;

    /// Format the timings of a strategy comparison, serial run first
    fn format_comparison(&self, user: &UserId, runs: &[StrategyRun]) -> String;
}

/// The summary of a profile, or an empty one if it was never finished
fn summary_of(profile: &Profile) -> Cow<'_, ProfileSummary> {
    match &profile.summary {
        Some(summary) => Cow::Borrowed(summary),
        None => Cow::Owned(ProfileSummary::default()),
    }
}

/// Render seconds after midnight as HH:MM:SS
pub fn format_time_of_day(seconds: f64) -> String {
    let secs = (seconds.max(0.0).round() as u32) % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render a Unix timestamp as a UTC date and time
pub fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Table formatter for human-readable output
///
/// Produces ASCII tables suitable for terminal display. Headings are
/// coloured unless colour has been disabled through `colored::control`.
pub struct TableFormatter;

impl TableFormatter {
    /// Format a number with thousands separators
    fn format_number(n: impl Into<u128>) -> String {
        let s = n.into().to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    fn format_ranking(entries: &[RankedEntry]) -> String {
        if entries.is_empty() {
            return "-".to_string();
        }
        entries
            .iter()
            .map(|e| format!("{} ({})", e.key, Self::format_number(e.count)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_range(range: Option<(i64, i64)>) -> String {
        match range {
            Some((first, last)) => {
                format!("{} .. {}", format_timestamp(first), format_timestamp(last))
            }
            None => "-".to_string(),
        }
    }

    fn format_tags(record: &Record) -> String {
        if record.tags.is_empty() {
            return "-".to_string();
        }
        record
            .tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }
}

impl OutputFormatter for TableFormatter {
    fn format_profile(&self, user: &UserId, profile: &Profile) -> String {
        let summary = summary_of(profile);
        let mut table = Self::new_table();
        table.set_titles(row![b -> "Metric", b -> "Value"]);

        table.add_row(row!["Sessions", r -> Self::format_number(profile.sessions)]);
        if let (Some(users), Some(per_user)) = (summary.user_count, summary.avg_sessions_per_user)
        {
            table.add_row(row!["Users", r -> Self::format_number(users)]);
            table.add_row(row!["Sessions per user", r -> format!("{per_user:.2}")]);
        }
        table.add_row(row![
            "Prompt tokens (total / min / max)",
            r -> format!(
                "{} / {} / {}",
                Self::format_number(profile.prompt_tokens.sum),
                Self::format_number(profile.min_prompt_tokens()),
                Self::format_number(profile.max_prompt_tokens())
            )
        ]);
        table.add_row(row!["Average prompt tokens", r -> format!("{:.2}", summary.avg_prompt_tokens)]);
        table.add_row(row![
            "Completion tokens (total / min / max)",
            r -> format!(
                "{} / {} / {}",
                Self::format_number(profile.completion_tokens.sum),
                Self::format_number(profile.min_completion_tokens()),
                Self::format_number(profile.max_completion_tokens())
            )
        ]);
        table.add_row(row![
            "Average completion tokens",
            r -> format!("{:.2}", summary.avg_completion_tokens)
        ]);
        table.add_row(row!["Average temperature", r -> format!("{:.2}", summary.avg_temperature)]);
        table.add_row(row![
            "Average session length",
            r -> format!("{:.1} min", summary.avg_session_duration_minutes)
        ]);
        table.add_row(row![
            "Usual creation time",
            r -> format_time_of_day(summary.avg_time_of_day_created)
        ]);
        table.add_row(row![
            "Usual open time",
            r -> format_time_of_day(summary.avg_time_of_day_opened)
        ]);
        table.add_row(row![
            "Usual exit time",
            r -> format_time_of_day(summary.avg_time_of_day_exited)
        ]);
        table.add_row(row!["Created", Self::format_range(profile.created_range())]);
        table.add_row(row!["Last opened", Self::format_range(profile.opened_range())]);
        table.add_row(row!["Top tags", Self::format_ranking(&summary.top_tags)]);
        table.add_row(row!["Top models", Self::format_ranking(&summary.top_model_families)]);
        table.add_row(row!["Top words", Self::format_ranking(&summary.top_words)]);

        format!(
            "{}\n{}",
            format!("Profile of {user}").bold().cyan(),
            table
        )
    }

    fn format_users(&self, users: &[(UserId, usize)]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![b -> "User", b -> "Sessions"]);
        let mut total = 0u64;
        for (user, sessions) in users {
            total += *sessions as u64;
            table.add_row(row![user.as_str(), r -> Self::format_number(*sessions as u64)]);
        }
        table.add_row(row![b -> "TOTAL", br -> Self::format_number(total)]);
        table.to_string()
    }

    fn format_sessions(&self, user: &UserId, sessions: &[Record]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Session",
            b -> "Owner",
            b -> "Model",
            b -> "Last opened",
            b -> "Last exit",
            b -> "Tags",
            b -> "Messages"
        ]);
        for record in sessions {
            table.add_row(row![
                record.session_id.as_str(),
                record.owner.as_str(),
                record.model_name.as_str(),
                format_timestamp(record.last_opened_at),
                format_timestamp(record.last_exit_at),
                Self::format_tags(record),
                r -> Self::format_number(record.messages.len() as u64)
            ]);
        }
        format!(
            "{}\n{}",
            format!("Sessions of {user} ({})", sessions.len()).bold().cyan(),
            table
        )
    }

    fn format_comparison(&self, user: &UserId, runs: &[StrategyRun]) -> String {
        let baseline = runs.first().map(|r| r.elapsed).unwrap_or_default();
        let mut table = Self::new_table();
        table.set_titles(row![b -> "Strategy", b -> "Sessions", b -> "Time (ms)", b -> "Speed-up"]);
        for run in runs {
            table.add_row(row![
                run.strategy.to_string(),
                r -> Self::format_number(run.profile.sessions),
                r -> format!("{:.3}", run.elapsed.as_secs_f64() * 1_000.0),
                r -> format!("{:.2}x", run.speedup_over(baseline))
            ]);
        }
        format!(
            "{}\n{}{}",
            format!("Strategy comparison for {user}").bold().cyan(),
            table,
            "All strategies produced the same profile".green()
        )
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

fn ranking_json(entries: &[RankedEntry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|e| json!({ "key": e.key, "count": e.count }))
            .collect(),
    )
}

/// A token total as a JSON integer, or a float once it leaves the `u64` range
fn total_json(sum: u128) -> Value {
    match u64::try_from(sum) {
        Ok(total) => json!(total),
        Err(_) => json!(sum as f64),
    }
}

fn range_json(range: Option<(i64, i64)>) -> Value {
    match range.and_then(|(first, last)| {
        Some((DateTime::from_timestamp(first, 0)?, DateTime::from_timestamp(last, 0)?))
    }) {
        Some((first, last)) => json!({ "first": first.to_rfc3339(), "last": last.to_rfc3339() }),
        None => Value::Null,
    }
}

/// A Unix timestamp as RFC 3339, or the raw number if out of range
fn timestamp_json(ts: i64) -> Value {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => json!(dt.to_rfc3339()),
        None => json!(ts),
    }
}

fn session_json(record: &Record) -> Value {
    json!({
        "session": record.session_id.as_str(),
        "user": record.owner.as_str(),
        "model": record.model_name.as_str(),
        "tags": record.tags,
        "created": timestamp_json(record.created_at),
        "lastOpened": timestamp_json(record.last_opened_at),
        "lastExited": timestamp_json(record.last_exit_at),
        "promptTokens": record.prompt_tokens,
        "completionTokens": record.completion_tokens,
        "messages": record.messages.len(),
    })
}

/// JSON document describing a profile
///
/// This is what `--json` prints and what `--output` writes.
pub fn profile_json(user: &UserId, profile: &Profile) -> Value {
    let summary = summary_of(profile);
    let mut doc = json!({
        "user": user.as_str(),
        "sessions": profile.sessions,
        "promptTokens": {
            "total": total_json(profile.prompt_tokens.sum),
            "min": profile.min_prompt_tokens(),
            "max": profile.max_prompt_tokens(),
            "average": summary.avg_prompt_tokens,
        },
        "completionTokens": {
            "total": total_json(profile.completion_tokens.sum),
            "min": profile.min_completion_tokens(),
            "max": profile.max_completion_tokens(),
            "average": summary.avg_completion_tokens,
        },
        "averageTemperature": summary.avg_temperature,
        "averageSessionMinutes": summary.avg_session_duration_minutes,
        "averageTimeOfDay": {
            "created": summary.avg_time_of_day_created,
            "opened": summary.avg_time_of_day_opened,
            "exited": summary.avg_time_of_day_exited,
        },
        "created": range_json(profile.created_range()),
        "lastOpened": range_json(profile.opened_range()),
        "lastExited": range_json(profile.exited_range()),
        "topTags": ranking_json(&summary.top_tags),
        "topWords": ranking_json(&summary.top_words),
        "topModels": ranking_json(&summary.top_model_families),
    });

    if let (Some(users), Some(per_user), Some(obj)) = (
        summary.user_count,
        summary.avg_sessions_per_user,
        doc.as_object_mut(),
    ) {
        obj.insert("userCount".to_string(), json!(users));
        obj.insert("averageSessionsPerUser".to_string(), json!(per_user));
    }
    doc
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl OutputFormatter for JsonFormatter {
    fn format_profile(&self, user: &UserId, profile: &Profile) -> String {
        to_pretty(&profile_json(user, profile))
    }

    fn format_users(&self, users: &[(UserId, usize)]) -> String {
        let list: Vec<Value> = users
            .iter()
            .map(|(user, sessions)| json!({ "user": user.as_str(), "sessions": sessions }))
            .collect();
        to_pretty(&json!({ "users": list }))
    }

    fn format_sessions(&self, user: &UserId, sessions: &[Record]) -> String {
        let list: Vec<Value> = sessions.iter().map(session_json).collect();
        to_pretty(&json!({ "user": user.as_str(), "sessions": list }))
    }

    fn format_comparison(&self, user: &UserId, runs: &[StrategyRun]) -> String {
        let baseline = runs.first().map(|r| r.elapsed).unwrap_or_default();
        let list: Vec<Value> = runs
            .iter()
            .map(|run| {
                json!({
                    "strategy": run.strategy.to_string(),
                    "sessions": run.profile.sessions,
                    "elapsedMs": run.elapsed.as_secs_f64() * 1_000.0,
                    "speedup": run.speedup_over(baseline),
                })
            })
            .collect();
        to_pretty(&json!({ "user": user.as_str(), "consistent": true, "runs": list }))
    }
}

/// Get the appropriate formatter based on output format preference
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
