use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::task::spawn_blocking;
use tokio::time::{Duration, Instant, sleep};

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::models::{Counters, Student};
use crate::platforms::{self, Platform, PlatformStats, Platforms};
use crate::score;

/// Per-platform count of fetches that failed (or had no handle) during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchFailures {
    pub leetcode: usize,
    pub gfg: usize,
    pub github: usize,
}

impl FetchFailures {
    fn record(&mut self, platform: Platform) {
        match platform {
            Platform::LeetCode => self.leetcode += 1,
            Platform::Gfg => self.gfg += 1,
            Platform::GitHub => self.github += 1,
        }
    }
}

/// What the caller of a refresh gets back. Individual failures only reach the log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshSummary {
    pub elapsed: Duration,
    pub succeeded: usize,
    pub failed: usize,
    pub fetch_failures: FetchFailures,
}

impl RefreshSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl std::fmt::Display for RefreshSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Refreshed {} students in {:.1}s: {} saved, {} failed \
             (fetch failures: leetcode {}, gfg {}, github {})",
            self.attempted(),
            self.elapsed.as_secs_f64(),
            self.succeeded,
            self.failed,
            self.fetch_failures.leetcode,
            self.fetch_failures.gfg,
            self.fetch_failures.github
        )
    }
}

struct StudentOutcome {
    saved: bool,
    failed_platforms: Vec<Platform>,
}

/// Refreshes every student's platform counters and score.
///
/// Students are processed `config.batch_size` at a time. Within a batch every student
/// runs concurrently, and each student's three fetches run concurrently; the whole
/// batch is joined before the next one starts, with `config.batch_delay` in between.
/// Only failing to list the students aborts the run. Database calls run on the
/// blocking pool.
pub async fn refresh_all(
    db: &Arc<Database>,
    platforms: &Platforms,
    config: &Config,
) -> Result<RefreshSummary> {
    let started = Instant::now();
    let students = spawn_blocking({
        let db = Arc::clone(db);
        move || db.query_students()
    })
    .await
    .context("Student listing task panicked.")?
    .context("Could not list students for refresh.")?;

    let batch_count = students.len().div_ceil(config.batch_size);
    log::info!(
        "Refreshing {} students in {} batches of up to {}.",
        students.len(),
        batch_count,
        config.batch_size
    );

    let mut summary = RefreshSummary::default();
    for (index, batch) in students.chunks(config.batch_size).enumerate() {
        if index > 0 && !config.batch_delay.is_zero() {
            sleep(config.batch_delay).await;
        }

        let outcomes = join_all(
            batch
                .iter()
                .map(|student| refresh_student(db, platforms, config.fetch_timeout, student)),
        )
        .await;

        for outcome in outcomes {
            if outcome.saved {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            for platform in outcome.failed_platforms {
                summary.fetch_failures.record(platform);
            }
        }

        log::debug!("[refresh_all] Finished batch {}/{}.", index + 1, batch_count);
    }

    summary.elapsed = started.elapsed();
    log::info!("{summary}");
    Ok(summary)
}

/// Fetches all three platforms for one student, then saves counters and score once.
async fn refresh_student(
    db: &Arc<Database>,
    clients: &Platforms,
    timeout: Duration,
    student: &Student,
) -> StudentOutcome {
    let handles = &student.handles;
    let (leetcode, gfg, github) = tokio::join!(
        platforms::fetch_bounded(clients.leetcode.as_ref(), handles.leetcode.as_deref(), timeout),
        platforms::fetch_bounded(clients.gfg.as_ref(), handles.gfg.as_deref(), timeout),
        platforms::fetch_bounded(clients.github.as_ref(), handles.github.as_deref(), timeout),
    );

    let mut updated = student.clone();
    let mut failed_platforms = Vec::new();
    merge(&mut updated.counters, &student.id, leetcode, &mut failed_platforms);
    merge(&mut updated.counters, &student.id, gfg, &mut failed_platforms);
    merge(&mut updated.counters, &student.id, github, &mut failed_platforms);
    updated.score = score::calculate(&updated.counters);
    let new_score = updated.score;

    let saved = match spawn_blocking({
        let db = Arc::clone(db);
        move || db.update_student_stats(&updated)
    })
    .await
    {
        Ok(Ok(())) => {
            log::trace!(
                "[refresh_student] {} now scores {new_score} (was {}).",
                student.id,
                student.score
            );
            true
        }
        Ok(Err(err)) => {
            log::error!("Could not save refreshed stats for {}: {err}", student.id);
            false
        }
        Err(err) => {
            log::error!("Saving refreshed stats for {} panicked: {err}", student.id);
            false
        }
    };

    StudentOutcome { saved, failed_platforms }
}

/// Applies a successful fetch; a failed one leaves that platform's counters as they were.
fn merge<T: PlatformStats>(
    counters: &mut Counters,
    student_id: &str,
    result: Result<T>,
    failed_platforms: &mut Vec<Platform>,
) {
    match result {
        Ok(stats) => stats.apply(counters),
        Err(err) => {
            log::warn!("[refresh_student] {} fetch skipped for {student_id}: {err:#}", T::PLATFORM);
            failed_platforms.push(T::PLATFORM);
        }
    }
}
