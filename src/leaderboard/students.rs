use anyhow::{Context, Result};
use itertools::Itertools;

use std::collections::{BTreeMap, HashMap};

use crate::db::Database;
use crate::leaderboard::{self, AggregationSummary, Clock};
use crate::models::{College, NATIONAL_REFERENCE, Scope, Snapshot, Student, StudentEntry};

impl StudentEntry {
    fn ranked(student: &Student, rank: usize) -> Self {
        Self {
            student_id: student.id.clone(),
            name: student.name.clone(),
            score: student.score,
            counters: student.counters,
            college_id: student.college_id.clone(),
            branch_id: student.branch_id.clone(),
            section_id: student.section_id.clone(),
            rank,
        }
    }
}

/// The reference a student is filed under for `scope`, if any. City and state come
/// from the student's college.
fn reference_for(
    student: &Student,
    colleges: &HashMap<&str, &College>,
    scope: Scope,
) -> Option<String> {
    let college = || student.college_id.as_deref().and_then(|id| colleges.get(id));

    match scope {
        Scope::Section => student.section_id.clone(),
        Scope::Branch => student.branch_id.clone(),
        Scope::College => student.college_id.clone(),
        Scope::City => college().map(|college| college.city.clone()),
        Scope::State => college().map(|college| college.state.clone()),
        Scope::National => Some(String::from(NATIONAL_REFERENCE)),
    }
}

/// Groups students by their reference in `scope`, ordered by reference.
/// The national group is always present, even when empty.
pub(crate) fn group_students<'a>(
    students: &'a [Student],
    colleges: &HashMap<&str, &College>,
    scope: Scope,
) -> BTreeMap<String, Vec<&'a Student>> {
    let mut groups: BTreeMap<String, Vec<&Student>> = students
        .iter()
        .filter(|student| student.is_student())
        .filter_map(|student| reference_for(student, colleges, scope).map(|r| (r, student)))
        .into_group_map()
        .into_iter()
        .collect();

    if scope == Scope::National {
        groups.entry(String::from(NATIONAL_REFERENCE)).or_default();
    }

    groups
}

/// Orders by score (highest first, ties by id), keeps the first `limit`, and ranks from 1.
pub(crate) fn rank_students(members: &[&Student], limit: Option<usize>) -> Vec<StudentEntry> {
    members
        .iter()
        .sorted_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)))
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, student)| StudentEntry::ranked(student, index + 1))
        .collect()
}

/// Rebuilds every student leaderboard (section through national) from current scores.
///
/// Each (scope, reference) snapshot is replaced wholesale. Failing to list students or
/// colleges, or to save any snapshot, aborts the remaining work; snapshots saved before
/// the failure stay in place.
pub fn generate_student_leaderboards(db: &Database, clock: &dyn Clock) -> Result<AggregationSummary> {
    let students = db.query_students().context("Could not list students for leaderboards.")?;
    let colleges = db.query_colleges().context("Could not list colleges for leaderboards.")?;
    let colleges_by_id: HashMap<&str, &College> =
        colleges.iter().map(|college| (college.id.as_str(), college)).collect();

    let mut summary = AggregationSummary::default();
    for scope in Scope::STUDENT {
        let groups = group_students(&students, &colleges_by_id, scope);
        log::debug!(
            "[generate_student_leaderboards] {} {scope} leaderboards to build.",
            groups.len()
        );

        for (reference, members) in groups {
            let snapshot = Snapshot {
                scope,
                entries: rank_students(&members, leaderboard::student_limit(scope)),
                reference,
                generated_at: clock.now(),
            };

            db.upsert_student_leaderboard(&snapshot).with_context(|| {
                format!("Could not save {scope} leaderboard for {}", snapshot.reference)
            })?;
            summary.record(&snapshot);
        }
    }

    log::info!("Student leaderboards rebuilt: {summary}.");
    Ok(summary)
}
