use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference value used for the single national-scope leaderboard.
pub const NATIONAL_REFERENCE: &str = "india";

/// Largest counter or score an SQLite INTEGER column can hold.
pub const MAX_STORED: u64 = i64::MAX as u64;

/// Students scoring strictly above this count as a college's top performers.
pub const TOP_PERFORMER_THRESHOLD: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Raw per-platform counters. Every field is always present; a platform that was
/// never fetched simply reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub easy_solved: u64,
    pub medium_solved: u64,
    pub hard_solved: u64,

    pub gfg_solved: u64,
    pub gfg_coding_score: u64,

    pub github_repos: u64,
}

impl Counters {
    pub fn values(&self) -> [u64; 6] {
        [
            self.easy_solved,
            self.medium_solved,
            self.hard_solved,
            self.gfg_solved,
            self.gfg_coding_score,
            self.github_repos,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handles {
    pub leetcode: Option<String>,
    pub gfg: Option<String>,
    pub github: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub role: Role,

    pub college_id: Option<String>,
    pub branch_id: Option<String>,
    pub section_id: Option<String>,

    pub handles: Handles,
    pub counters: Counters,

    pub score: u64,
}

impl Student {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

impl std::fmt::Display for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**{}** ({})\n\
             \tEasy Solved: {}\n\
             \tMedium Solved: {}\n\
             \tHard Solved: {}\n\
             \tGFG Solved: {}\n\
             \tGFG Coding Score: {}\n\
             \tGitHub Repos: {}\n\
             \tScore: {}",
            self.name,
            self.id,
            self.counters.easy_solved,
            self.counters.medium_solved,
            self.counters.hard_solved,
            self.counters.gfg_solved,
            self.counters.gfg_coding_score,
            self.counters.github_repos,
            self.score
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct College {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub college_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub branch_id: String,
}

/// Aggregation granularity of a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Section,
    Branch,
    College,
    City,
    State,
    National,
}

impl Scope {
    /// Scopes of the student leaderboard family, finest first.
    pub const STUDENT: [Scope; 6] = [
        Scope::Section,
        Scope::Branch,
        Scope::College,
        Scope::City,
        Scope::State,
        Scope::National,
    ];

    /// Scopes of the college leaderboard family.
    pub const INSTITUTION: [Scope; 3] = [Scope::City, Scope::State, Scope::National];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Section => "section",
            Scope::Branch => "branch",
            Scope::College => "college",
            Scope::City => "city",
            Scope::State => "state",
            Scope::National => "national",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "section" => Ok(Scope::Section),
            "branch" => Ok(Scope::Branch),
            "college" => Ok(Scope::College),
            "city" => Ok(Scope::City),
            "state" => Ok(Scope::State),
            "national" => Ok(Scope::National),
            other => Err(format!("Unknown scope: {other}")),
        }
    }
}

/// Which family of leaderboards a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Students,
    Colleges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEntry {
    pub student_id: String,
    pub name: String,
    pub score: u64,
    #[serde(flatten)]
    pub counters: Counters,

    pub college_id: Option<String>,
    pub branch_id: Option<String>,
    pub section_id: Option<String>,

    pub rank: usize,
}

impl std::fmt::Display for StudentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:<3} {:<24} {}", self.rank, self.name, self.score)
    }
}

/// Sums (or rounded means) of the platform counters over a college's students.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformTotals {
    pub easy_solved: u64,
    pub medium_solved: u64,
    pub hard_solved: u64,
    pub gfg_solved: u64,
    pub github_repos: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeEntry {
    pub college_id: String,
    pub name: String,
    pub city: String,
    pub state: String,

    pub total_students: u64,
    pub total_score: u64,
    pub average_score: u64,
    pub top_performers: u64,

    pub totals: PlatformTotals,
    pub averages: PlatformTotals,

    pub rank: usize,
}

impl std::fmt::Display for CollegeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{:<3} {:<32} avg {} ({} students, {} top performers)",
            self.rank, self.name, self.average_score, self.total_students, self.top_performers
        )
    }
}

/// A persisted, fully replaced leaderboard for one (scope, reference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<E> {
    pub scope: Scope,
    pub reference: String,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<E>,
}
