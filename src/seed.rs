use anyhow::{Context, Result};

use crate::db::Database;
use crate::models::{Branch, College, Counters, Handles, Role, Section, Student};
use crate::score;

/// Counts of rows added by [`seed_demo`]. Rows that already existed are not counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub colleges: usize,
    pub branches: usize,
    pub sections: usize,
    pub students: usize,
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} colleges, {} branches, {} sections, {} students",
            self.colleges, self.branches, self.sections, self.students
        )
    }
}

fn counters(easy: u64, medium: u64, hard: u64, gfg: u64, gfg_score: u64, repos: u64) -> Counters {
    Counters {
        easy_solved: easy,
        medium_solved: medium,
        hard_solved: hard,
        gfg_solved: gfg,
        gfg_coding_score: gfg_score,
        github_repos: repos,
    }
}

/// Loads a small two-state hierarchy with a handful of students, so leaderboards can be
/// built without any platform access. Safe to run repeatedly.
pub fn seed_demo(db: &Database) -> Result<SeedSummary> {
    let colleges = [
        ("iitb", "IIT Bombay", "Mumbai", "Maharashtra"),
        ("coep", "COEP Technological University", "Pune", "Maharashtra"),
        ("iisc", "Indian Institute of Science", "Bengaluru", "Karnataka"),
    ];
    let branches = [("iitb-cse", "CSE", "iitb"), ("coep-it", "IT", "coep"), ("iisc-cds", "CDS", "iisc")];
    let sections = [("iitb-cse-a", "A", "iitb-cse"), ("iitb-cse-b", "B", "iitb-cse"), ("coep-it-a", "A", "coep-it")];

    // (college, branch, section)
    let iitb_a = (Some("iitb"), Some("iitb-cse"), Some("iitb-cse-a"));
    let iitb_b = (Some("iitb"), Some("iitb-cse"), Some("iitb-cse-b"));
    let coep_a = (Some("coep"), Some("coep-it"), Some("coep-it-a"));
    let iisc = (Some("iisc"), None, None);
    let unplaced = (None, None, None);

    let students = [
        ("stu-001", "Aarav Shah", Role::Student, iitb_a, counters(120, 80, 25, 150, 420, 12)),
        ("stu-002", "Diya Kulkarni", Role::Student, iitb_a, counters(60, 20, 2, 40, 110, 3)),
        ("stu-003", "Kabir Menon", Role::Student, iitb_b, counters(200, 150, 60, 0, 0, 20)),
        ("stu-004", "Ishita Joshi", Role::Student, coep_a, counters(50, 30, 10, 80, 200, 4)),
        ("stu-005", "Rohan Patil", Role::Student, coep_a, counters(5, 0, 0, 10, 15, 0)),
        ("stu-006", "Meera Rao", Role::Student, iisc, counters(90, 40, 8, 60, 150, 7)),
        ("tch-001", "Prof. Anand Iyer", Role::Teacher, unplaced, Counters::default()),
    ];

    let mut summary = SeedSummary::default();

    for (id, name, city, state) in colleges {
        let college = College {
            id: id.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        };
        if db.insert_college(&college).context("Could not seed colleges.")? {
            summary.colleges += 1;
        }
    }

    for (id, name, college_id) in branches {
        let branch = Branch { id: id.to_string(), name: name.to_string(), college_id: college_id.to_string() };
        if db.insert_branch(&branch).context("Could not seed branches.")? {
            summary.branches += 1;
        }
    }

    for (id, name, branch_id) in sections {
        let section = Section { id: id.to_string(), name: name.to_string(), branch_id: branch_id.to_string() };
        if db.insert_section(&section).context("Could not seed sections.")? {
            summary.sections += 1;
        }
    }

    for (id, name, role, (college_id, branch_id, section_id), counters) in students {
        if db.query_student(id)?.is_some() {
            continue;
        }

        let slug = name.to_lowercase().replace([' ', '.'], "");
        let student = Student {
            id: id.to_string(),
            name: name.to_string(),
            role,
            college_id: college_id.map(String::from),
            branch_id: branch_id.map(String::from),
            section_id: section_id.map(String::from),
            handles: Handles {
                leetcode: Some(slug.clone()),
                gfg: Some(slug.clone()),
                github: Some(slug),
            },
            counters,
            score: score::calculate(&counters),
        };

        db.insert_student(&student).context("Could not seed students.")?;
        summary.students += 1;
    }

    log::info!("Seeded {summary}.");
    Ok(summary)
}
