use chrono::{DateTime, Utc};

use crate::models::{Scope, Snapshot};

pub mod colleges;
pub mod students;

pub use colleges::generate_college_leaderboards;
pub use students::generate_student_leaderboards;

/// Student leaderboards wider than a section keep only this many entries.
pub const TOP_N: usize = 30;

/// Source of `generatedAt` stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// How many entries a student leaderboard in `scope` keeps, `None` meaning all of them.
pub fn student_limit(scope: Scope) -> Option<usize> {
    match scope {
        Scope::Section => None,
        _ => Some(TOP_N),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSummary {
    pub snapshots: usize,
    pub entries: usize,
}

impl AggregationSummary {
    fn record<E>(&mut self, snapshot: &Snapshot<E>) {
        self.snapshots += 1;
        self.entries += snapshot.entries.len();
    }
}

impl std::fmt::Display for AggregationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} snapshots ({} entries)", self.snapshots, self.entries)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Branch, College, Counters, Handles, Role, Section, Student};

    pub(crate) struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    pub(crate) fn add_college(db: &Database, id: &str, city: &str, state: &str) {
        db.insert_college(&College {
            id: id.to_string(),
            name: format!("College {id}"),
            city: city.to_string(),
            state: state.to_string(),
        })
        .unwrap();
    }

    pub(crate) fn add_branch(db: &Database, id: &str, college_id: &str) {
        db.insert_branch(&Branch {
            id: id.to_string(),
            name: id.to_uppercase(),
            college_id: college_id.to_string(),
        })
        .unwrap();
    }

    pub(crate) fn add_section(db: &Database, id: &str, branch_id: &str) {
        db.insert_section(&Section {
            id: id.to_string(),
            name: id.to_uppercase(),
            branch_id: branch_id.to_string(),
        })
        .unwrap();
    }

    /// Inserts a student placed at (college, branch, section) with a precomputed score.
    pub(crate) fn add_student(
        db: &Database,
        id: &str,
        placement: (Option<&str>, Option<&str>, Option<&str>),
        score: u64,
        counters: Counters,
    ) {
        let (college, branch, section) = placement;
        db.insert_student(&Student {
            id: id.to_string(),
            name: format!("Student {id}"),
            role: Role::Student,
            college_id: college.map(String::from),
            branch_id: branch.map(String::from),
            section_id: section.map(String::from),
            handles: Handles::default(),
            counters,
            score,
        })
        .unwrap();
    }

    #[test]
    fn only_sections_are_untruncated() {
        assert_eq!(student_limit(Scope::Section), None);
        for scope in &Scope::STUDENT[1..] {
            assert_eq!(student_limit(*scope), Some(30));
        }
    }
}
