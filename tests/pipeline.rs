use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use codeboard::config::Config;
use codeboard::db::Database;
use codeboard::leaderboard::Clock;
use codeboard::models::{NATIONAL_REFERENCE, Scope};
use codeboard::pipeline::Pipeline;
use codeboard::platforms::{GfgStats, GitHubStats, LeetCodeStats, PlatformClient, Platforms};
use codeboard::{score, seed};

struct Frozen(DateTime<Utc>);

impl Clock for Frozen {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Answers from a fixed table of handles; unknown handles fail like a missing profile.
struct Directory<T>(HashMap<String, T>);

#[async_trait]
impl<T: Clone + Send + Sync> PlatformClient<T> for Directory<T> {
    async fn fetch(&self, handle: &str) -> Result<T> {
        self.0
            .get(handle)
            .cloned()
            .ok_or_else(|| anyhow!("No profile for {handle}"))
    }
}

fn platforms() -> Platforms {
    let leetcode = HashMap::from([
        (String::from("aaravshah"), LeetCodeStats { easy_solved: 300, medium_solved: 200, hard_solved: 50 }),
        (String::from("rohanpatil"), LeetCodeStats { easy_solved: 100, medium_solved: 50, hard_solved: 10 }),
    ]);
    let gfg = HashMap::from([(String::from("rohanpatil"), GfgStats { solved: 90, coding_score: 400 })]);
    let github = HashMap::from([(String::from("diyakulkarni"), GitHubStats { repos: 30 })]);

    Platforms {
        leetcode: Arc::new(Directory(leetcode)),
        gfg: Arc::new(Directory(gfg)),
        github: Arc::new(Directory(github)),
    }
}

fn pipeline(db: &Arc<Database>) -> Pipeline {
    let config = Config {
        batch_size: 2,
        batch_delay: Duration::ZERO,
        fetch_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let clock = Frozen(Utc.with_ymd_and_hms(2026, 7, 1, 6, 0, 0).unwrap());

    Pipeline::new(Arc::clone(db), platforms(), config, Arc::new(clock))
}

#[tokio::test]
async fn full_run_refreshes_and_publishes() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    seed::seed_demo(&db).unwrap();

    let report = pipeline(&db).run().await.unwrap();
    // the teacher account is not refreshed
    assert_eq!(report.refresh.attempted(), 6);
    assert_eq!(report.refresh.failed, 0);

    let rohan = db.query_student("stu-005").unwrap().unwrap();
    assert_eq!(rohan.counters.easy_solved, 100);
    assert_eq!(rohan.counters.gfg_coding_score, 400);
    assert_eq!(rohan.score, score::calculate(&rohan.counters));

    let national = db
        .query_student_leaderboard(Scope::National, NATIONAL_REFERENCE)
        .unwrap()
        .unwrap();
    assert_eq!(national.entries.len(), 6);
    assert_eq!(national.entries[0].student_id, "stu-001");
    assert!(national.entries.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(national.generated_at, Utc.with_ymd_and_hms(2026, 7, 1, 6, 0, 0).unwrap());

    let section = db.query_student_leaderboard(Scope::Section, "coep-it-a").unwrap().unwrap();
    assert_eq!(section.entries.len(), 2);

    let maharashtra = db.query_college_leaderboard(Scope::State, "Maharashtra").unwrap().unwrap();
    let ranked: Vec<_> = maharashtra.entries.iter().map(|e| (e.rank, e.college_id.as_str())).collect();
    assert_eq!(ranked, vec![(1, "iitb"), (2, "coep")]);

    let karnataka = db.query_college_leaderboard(Scope::State, "Karnataka").unwrap().unwrap();
    assert_eq!(karnataka.entries[0].total_students, 1);
}

#[tokio::test]
async fn second_pipeline_waits_its_turn() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let holder_at = Utc.with_ymd_and_hms(2026, 7, 1, 5, 0, 0).unwrap();
    assert!(db.try_acquire_run_lock("cron", holder_at, chrono::Duration::hours(6)).unwrap());

    let err = pipeline(&db).rebuild_leaderboards().await.unwrap_err();
    assert!(err.to_string().contains("already in progress"));
    assert!(db.query_student_leaderboard(Scope::National, NATIONAL_REFERENCE).unwrap().is_none());

    assert!(db.release_run_lock("cron").unwrap());
    pipeline(&db).rebuild_leaderboards().await.unwrap();
    assert!(db.query_student_leaderboard(Scope::National, NATIONAL_REFERENCE).unwrap().is_some());
}
