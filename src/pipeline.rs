use anyhow::{Context, Result, bail};
use tokio::task::spawn_blocking;
use tokio::time::{Duration, Instant, sleep};

use std::future::Future;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::leaderboard::{self, AggregationSummary, Clock};
use crate::platforms::Platforms;
use crate::refresh::{self, RefreshSummary};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub elapsed: Duration,
    pub refresh: RefreshSummary,
    pub students: AggregationSummary,
    pub colleges: AggregationSummary,
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\nStudent leaderboards: {}\nCollege leaderboards: {}\nTotal time: {:.1}s",
            self.refresh,
            self.students,
            self.colleges,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Stats refresh followed by both leaderboard rebuilds, guarded by the run lock.
pub struct Pipeline {
    db: Arc<Database>,
    platforms: Platforms,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(db: Arc<Database>, platforms: Platforms, config: Config, clock: Arc<dyn Clock>) -> Self {
        Self { db, platforms, config, clock }
    }

    /// Refreshes every student, then rebuilds all leaderboards from the new scores.
    pub async fn run(&self) -> Result<PipelineReport> {
        self.with_run_lock(async {
            let started = Instant::now();
            let refresh = refresh::refresh_all(&self.db, &self.platforms, &self.config).await?;
            let (students, colleges) = self.aggregate().await?;

            Ok(PipelineReport { elapsed: started.elapsed(), refresh, students, colleges })
        })
        .await
    }

    /// Refreshes stats and scores only.
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        self.with_run_lock(refresh::refresh_all(&self.db, &self.platforms, &self.config))
            .await
    }

    /// Rebuilds leaderboards from whatever scores are currently stored.
    pub async fn rebuild_leaderboards(&self) -> Result<(AggregationSummary, AggregationSummary)> {
        self.with_run_lock(self.aggregate()).await
    }

    /// Runs the full pipeline every `refresh_interval`, forever. A failed run is logged
    /// and the next one still happens on schedule.
    pub async fn watch(&self) {
        loop {
            match self.run().await {
                Ok(report) => log::info!("Pipeline run finished.\n{report}"),
                Err(err) => log::error!("Pipeline run failed: {err:#}"),
            }

            log::info!(
                "Next run in {} minutes.",
                self.config.refresh_interval.as_secs() / 60
            );
            sleep(self.config.refresh_interval).await;
        }
    }

    /// The two aggregators read the same student data and write disjoint snapshot
    /// tables, so they run side by side.
    async fn aggregate(&self) -> Result<(AggregationSummary, AggregationSummary)> {
        let students = spawn_blocking({
            let db = Arc::clone(&self.db);
            let clock = Arc::clone(&self.clock);
            move || leaderboard::generate_student_leaderboards(&db, clock.as_ref())
        });
        let colleges = spawn_blocking({
            let db = Arc::clone(&self.db);
            let clock = Arc::clone(&self.clock);
            move || leaderboard::generate_college_leaderboards(&db, clock.as_ref())
        });

        let (students, colleges) = tokio::join!(students, colleges);
        let students = students.context("Student leaderboard task panicked.")?;
        let colleges = colleges.context("College leaderboard task panicked.")?;

        Ok((students?, colleges?))
    }

    async fn with_run_lock<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        let now = self.clock.now();
        let holder = format!(
            "{}-{}",
            std::process::id(),
            now.timestamp_nanos_opt().unwrap_or_default()
        );
        let ttl = chrono::Duration::from_std(self.config.lock_ttl)
            .context("LOCK_TTL_SECS is out of range.")?;

        let acquired = self
            .db
            .try_acquire_run_lock(&holder, now, ttl)
            .context("Could not take the pipeline lock.")?;
        if !acquired {
            bail!("Another pipeline run is already in progress.");
        }
        log::debug!("[with_run_lock] Pipeline lock taken by {holder}.");

        let result = work.await;

        match self.db.release_run_lock(&holder) {
            Ok(true) => log::debug!("[with_run_lock] Pipeline lock released by {holder}."),
            Ok(false) => log::warn!("Pipeline lock for {holder} was already gone."),
            Err(err) => log::error!("Could not release the pipeline lock for {holder}: {err}"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::tests::{FixedClock, add_college, add_student};
    use crate::models::{Counters, NATIONAL_REFERENCE, Scope};
    use crate::platforms::tests::StubClient;
    use crate::platforms::{GfgStats, GitHubStats, LeetCodeStats};
    use chrono::{TimeZone, Utc};

    fn pipeline(db: Arc<Database>) -> Pipeline {
        let platforms = Platforms {
            leetcode: Arc::new(StubClient::<LeetCodeStats>::failing("no handle")),
            gfg: Arc::new(StubClient::<GfgStats>::failing("no handle")),
            github: Arc::new(StubClient::<GitHubStats>::failing("no handle")),
        };
        let config = Config { batch_delay: Duration::ZERO, ..Config::default() };
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap());

        Pipeline::new(db, platforms, config, Arc::new(clock))
    }

    #[tokio::test]
    async fn rebuild_writes_both_families() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        add_college(&db, "c1", "Jaipur", "Rajasthan");
        add_student(&db, "a", (Some("c1"), None, None), 1200, Counters::default());

        let (students, colleges) = pipeline(Arc::clone(&db)).rebuild_leaderboards().await.unwrap();
        // college, city, state, national
        assert_eq!(students.snapshots, 4);
        assert_eq!(colleges.snapshots, 3);

        assert!(db.query_college_leaderboard(Scope::National, NATIONAL_REFERENCE).unwrap().is_some());
    }

    #[tokio::test]
    async fn overlapping_run_is_refused() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();
        assert!(db.try_acquire_run_lock("other", now, chrono::Duration::hours(6)).unwrap());

        let err = pipeline(Arc::clone(&db)).run().await.unwrap_err();
        assert!(err.to_string().contains("already in progress"));

        // the refusal must not release someone else's lock
        assert!(db.release_run_lock("other").unwrap());
    }

    #[tokio::test]
    async fn lock_is_released_after_failure() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.connect().execute_batch("DROP TABLE Students;").unwrap();

        let pipeline = pipeline(Arc::clone(&db));
        assert!(pipeline.refresh().await.is_err());

        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 5, 0).unwrap();
        assert!(db.try_acquire_run_lock("next", now, chrono::Duration::hours(6)).unwrap());
    }
}
