use anyhow::{Context, Result};
use itertools::Itertools;

use std::collections::{BTreeMap, HashMap};

use crate::db::Database;
use crate::leaderboard::{AggregationSummary, Clock};
use crate::models::{
    College, CollegeEntry, NATIONAL_REFERENCE, PlatformTotals, Scope, Snapshot, Student,
    TOP_PERFORMER_THRESHOLD,
};

fn mean(total: u64, count: u64) -> u64 {
    (total as f64 / count as f64).round() as u64
}

/// Rolls a college's students up into an (unranked) entry. Colleges without students
/// have no entry.
pub(crate) fn rollup(college: &College, students: &[&Student]) -> Option<CollegeEntry> {
    if students.is_empty() {
        return None;
    }

    let total_students = students.len() as u64;
    let mut totals = PlatformTotals::default();
    let mut total_score: u64 = 0;
    let mut top_performers = 0;

    for student in students {
        let counters = &student.counters;
        totals.easy_solved = totals.easy_solved.saturating_add(counters.easy_solved);
        totals.medium_solved = totals.medium_solved.saturating_add(counters.medium_solved);
        totals.hard_solved = totals.hard_solved.saturating_add(counters.hard_solved);
        totals.gfg_solved = totals.gfg_solved.saturating_add(counters.gfg_solved);
        totals.github_repos = totals.github_repos.saturating_add(counters.github_repos);

        total_score = total_score.saturating_add(student.score);
        if student.score > TOP_PERFORMER_THRESHOLD {
            top_performers += 1;
        }
    }

    let averages = PlatformTotals {
        easy_solved: mean(totals.easy_solved, total_students),
        medium_solved: mean(totals.medium_solved, total_students),
        hard_solved: mean(totals.hard_solved, total_students),
        gfg_solved: mean(totals.gfg_solved, total_students),
        github_repos: mean(totals.github_repos, total_students),
    };

    Some(CollegeEntry {
        college_id: college.id.clone(),
        name: college.name.clone(),
        city: college.city.clone(),
        state: college.state.clone(),
        total_students,
        total_score,
        average_score: mean(total_score, total_students),
        top_performers,
        totals,
        averages,
        rank: 0,
    })
}

/// Orders by average score, then student count (both highest first), then id; every
/// entry is ranked, nothing is cut.
pub(crate) fn rank_colleges(entries: Vec<CollegeEntry>) -> Vec<CollegeEntry> {
    entries
        .into_iter()
        .sorted_by(|a, b| {
            b.average_score
                .cmp(&a.average_score)
                .then_with(|| b.total_students.cmp(&a.total_students))
                .then_with(|| a.college_id.cmp(&b.college_id))
        })
        .enumerate()
        .map(|(index, entry)| CollegeEntry { rank: index + 1, ..entry })
        .collect()
}

fn reference_for(college: &College, scope: Scope) -> String {
    match scope {
        Scope::City => college.city.clone(),
        Scope::State => college.state.clone(),
        _ => String::from(NATIONAL_REFERENCE),
    }
}

/// Rebuilds the city, state and national college leaderboards.
///
/// Failing to list colleges or students, or to save a snapshot, aborts the remaining
/// work; snapshots saved before the failure stay in place.
pub fn generate_college_leaderboards(db: &Database, clock: &dyn Clock) -> Result<AggregationSummary> {
    let colleges = db.query_colleges().context("Could not list colleges for leaderboards.")?;
    let students = db.query_students().context("Could not list students for leaderboards.")?;

    let students_by_college: HashMap<&str, Vec<&Student>> = students
        .iter()
        .filter(|student| student.is_student())
        .filter_map(|student| student.college_id.as_deref().map(|id| (id, student)))
        .into_group_map();

    let rollups: HashMap<&str, CollegeEntry> = colleges
        .iter()
        .filter_map(|college| {
            let members = students_by_college.get(college.id.as_str())?;
            rollup(college, members).map(|entry| (college.id.as_str(), entry))
        })
        .collect();

    log::debug!(
        "[generate_college_leaderboards] {} of {} colleges have students.",
        rollups.len(),
        colleges.len()
    );

    let mut summary = AggregationSummary::default();
    for scope in Scope::INSTITUTION {
        let mut groups: BTreeMap<String, Vec<&College>> = colleges
            .iter()
            .map(|college| (reference_for(college, scope), college))
            .into_group_map()
            .into_iter()
            .collect();

        if scope == Scope::National {
            groups.entry(String::from(NATIONAL_REFERENCE)).or_default();
        }

        for (reference, members) in groups {
            let entries = members
                .iter()
                .filter_map(|college| rollups.get(college.id.as_str()).cloned())
                .collect();

            let snapshot = Snapshot {
                scope,
                reference,
                generated_at: clock.now(),
                entries: rank_colleges(entries),
            };

            db.upsert_college_leaderboard(&snapshot).with_context(|| {
                format!("Could not save {scope} college leaderboard for {}", snapshot.reference)
            })?;
            summary.record(&snapshot);
        }
    }

    log::info!("College leaderboards rebuilt: {summary}.");
    Ok(summary)
}
