//! Single-threaded baseline strategy

use crate::strategy::Strategy;
use chatstat_core::error::Result;
use chatstat_core::reducer::Reducer;
use chatstat_core::types::Record;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-order fold on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct Serial;

/// Fold `records` in order into a fresh accumulator, without finishing
///
/// Stops at the first record the reducer rejects.
pub fn fold<R: Reducer>(records: &[Record], reducer: &R) -> Result<R::Accumulator> {
    let mut acc = reducer.identity();
    for record in records {
        reducer.accumulate(&mut acc, record)?;
    }
    Ok(acc)
}

impl Strategy for Serial {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn run<R: Reducer>(&self, records: &[Record], reducer: &R) -> Result<R::Accumulator> {
        fold(records, reducer).map(|acc| reducer.finish(acc))
    }
}

/// Like [`fold`], but gives up early once `failed` is raised by another
/// worker, and raises it itself when the reducer rejects a record
///
/// An early exit returns the incomplete accumulator as `Ok`; the caller
/// discards it because the failing worker's error is reported instead.
pub(crate) fn fold_until_failed<R: Reducer>(
    records: &[Record],
    reducer: &R,
    failed: &AtomicBool,
) -> Result<R::Accumulator> {
    let mut acc = reducer.identity();
    for record in records {
        if failed.load(Ordering::Relaxed) {
            break;
        }
        if let Err(e) = reducer.accumulate(&mut acc, record) {
            failed.store(true, Ordering::Relaxed);
            return Err(e);
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatstat_core::error::ChatstatError;
    use chatstat_core::reducer::ProfileReducer;
    use chatstat_core::types::{ModelName, SessionId, UserId};

    fn record(id: &str, prompt_tokens: u64, temperature: f64) -> Record {
        Record {
            owner: UserId::new("ann"),
            session_id: SessionId::new(id),
            model_name: ModelName::new("GPT-4o"),
            tags: Default::default(),
            prompt_tokens,
            completion_tokens: 1,
            temperature,
            created_at: 100,
            last_opened_at: 100,
            last_exit_at: 160,
            messages: Vec::new(),
        }
    }

    #[test]
    fn test_serial_run_finishes() {
        let reducer = ProfileReducer::default();
        let records = vec![record("a", 5, 1.0), record("b", 7, 1.0)];
        let profile = Serial.run(&records, &reducer).unwrap();
        assert_eq!(profile.prompt_tokens.sum, 12);
        assert!(profile.is_finished());
    }

    #[test]
    fn test_serial_stops_at_malformed_record() {
        let reducer = ProfileReducer::default();
        let records = vec![record("a", 5, 1.0), record("b", 7, -1.0), record("c", 9, 1.0)];
        let err = Serial.run(&records, &reducer).unwrap_err();
        assert!(matches!(err, ChatstatError::MalformedRecord { ref session, .. } if session.as_str() == "b"));
    }

    #[test]
    fn test_fold_until_failed_raises_flag() {
        let reducer = ProfileReducer::default();
        let failed = AtomicBool::new(false);
        let records = vec![record("a", 5, 3.0)];
        assert!(fold_until_failed(&records, &reducer, &failed).is_err());
        assert!(failed.load(Ordering::Relaxed));

        // a raised flag stops a healthy fold before it does any work
        let healthy = vec![record("b", 5, 1.0)];
        let partial = fold_until_failed(&healthy, &reducer, &failed).unwrap();
        assert_eq!(partial.sessions, 0);
    }
}
