//! Profile generation service
//!
//! [`ProfileService`] ties a [`SessionStore`] to the scheduler: it fetches the
//! records for a user (or for every user when asked for the admin profile),
//! runs the selected strategy on a blocking thread, and attaches the
//! audience statistics to admin profiles.

use chatstat_core::error::{ChatstatError, Result};
use chatstat_core::profile::Profile;
use chatstat_core::reducer::ProfileReducer;
use chatstat_core::store::SessionStore;
use chatstat_core::types::{Record, UserId};
use chatstat_scheduler::{Scheduler, StrategyKind};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Tolerance for real-valued fields when comparing strategy results
pub const COMPARE_EPSILON: f64 = 1e-9;

/// Outcome of one strategy during [`ProfileService::compare`]
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub strategy: StrategyKind,
    /// Wall-clock time of the reduction alone, excluding store access
    pub elapsed: Duration,
    pub profile: Profile,
}

impl StrategyRun {
    /// How many times faster this run was than `baseline`
    pub fn speedup_over(&self, baseline: Duration) -> f64 {
        let own = self.elapsed.as_secs_f64();
        if own == 0.0 {
            0.0
        } else {
            baseline.as_secs_f64() / own
        }
    }
}

/// Records fetched for one profile request
struct Loaded {
    records: Arc<Vec<Record>>,
    /// Number of users covered, only for the admin audience
    user_count: Option<u64>,
}

impl Loaded {
    fn attach_audience(&self, profile: Profile) -> Profile {
        match self.user_count {
            Some(users) => profile.with_audience(users),
            None => profile,
        }
    }
}

/// Computes profiles from a session store
pub struct ProfileService<S> {
    store: Arc<S>,
    scheduler: Arc<Scheduler>,
    reducer: Arc<ProfileReducer>,
}

impl<S: SessionStore + 'static> ProfileService<S> {
    pub fn new(store: Arc<S>, scheduler: Scheduler, reducer: ProfileReducer) -> Self {
        Self {
            store,
            scheduler: Arc::new(scheduler),
            reducer: Arc::new(reducer),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Finished profile of `user` computed with `strategy`
    ///
    /// The admin user stands for the union of every user's sessions; its
    /// profile also carries the user count and sessions per user.
    pub async fn generate(&self, user: &UserId, strategy: StrategyKind) -> Result<Profile> {
        let loaded = self.load(user).await?;

        let start = Instant::now();
        let profile = self.reduce(strategy, Arc::clone(&loaded.records)).await?;
        info!(
            "Profiled {} sessions of {} with {} in {:?}",
            profile.sessions,
            user,
            strategy,
            start.elapsed()
        );
        Ok(loaded.attach_audience(profile))
    }

    /// Run every strategy over the same records and check they agree
    ///
    /// Returns one [`StrategyRun`] per strategy, serial first. Fails with
    /// [`ChatstatError::StrategyMismatch`] naming the first strategy whose
    /// profile differs from the serial one.
    pub async fn compare(&self, user: &UserId) -> Result<Vec<StrategyRun>> {
        let loaded = self.load(user).await?;

        let mut runs = Vec::with_capacity(StrategyKind::ALL.len());
        for strategy in StrategyKind::ALL {
            let start = Instant::now();
            let profile = self.reduce(strategy, Arc::clone(&loaded.records)).await?;
            let elapsed = start.elapsed();
            debug!("{} finished in {:?}", strategy, elapsed);
            runs.push(StrategyRun {
                strategy,
                elapsed,
                profile: loaded.attach_audience(profile),
            });
        }

        if let Some((baseline, rest)) = runs.split_first() {
            for run in rest {
                if !run.profile.approx_eq(&baseline.profile, COMPARE_EPSILON) {
                    return Err(ChatstatError::StrategyMismatch {
                        strategy: run.strategy.to_string(),
                    });
                }
            }
        }
        Ok(runs)
    }

    /// Sessions of `user` in store order
    ///
    /// The admin user lists every user's sessions, user by user.
    pub async fn sessions(&self, user: &UserId) -> Result<Vec<Record>> {
        let loaded = self.load(user).await?;
        Ok(Arc::unwrap_or_clone(loaded.records))
    }

    /// Every user with their number of sessions, in user order
    pub async fn user_sessions(&self) -> Result<Vec<(UserId, usize)>> {
        let users = self.store.all_users().await?;
        let counts = try_join_all(users.iter().map(|u| self.store.session_count(u))).await?;
        Ok(users.into_iter().zip(counts).collect())
    }

    async fn load(&self, user: &UserId) -> Result<Loaded> {
        if !user.is_admin() {
            let records = self.store.sessions_of(user).await?;
            debug!("Loaded {} sessions of {}", records.len(), user);
            return Ok(Loaded {
                records: Arc::new(records),
                user_count: None,
            });
        }

        let users = self.store.all_users().await?;
        let per_user = try_join_all(users.iter().map(|u| self.store.sessions_of(u))).await?;
        let records: Vec<Record> = per_user.into_iter().flatten().collect();
        debug!("Loaded {} sessions of {} users", records.len(), users.len());
        Ok(Loaded {
            records: Arc::new(records),
            user_count: Some(users.len() as u64),
        })
    }

    async fn reduce(&self, strategy: StrategyKind, records: Arc<Vec<Record>>) -> Result<Profile> {
        let scheduler = Arc::clone(&self.scheduler);
        let reducer = Arc::clone(&self.reducer);
        tokio::task::spawn_blocking(move || scheduler.run(strategy, &records, reducer.as_ref()))
            .await
            .map_err(|e| ChatstatError::Scheduler(format!("aggregation task failed: {e}")))?
    }
}
