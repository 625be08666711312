pub const COLLEGES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Colleges (
        id             TEXT        PRIMARY KEY,
        name           TEXT        NOT NULL,
        city           TEXT        NOT NULL,
        state          TEXT        NOT NULL
    )";

pub const BRANCHES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Branches (
        id             TEXT        PRIMARY KEY,
        name           TEXT        NOT NULL,
        college_id     TEXT        NOT NULL    REFERENCES Colleges(id)
    )";

pub const SECTIONS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Sections (
        id             TEXT        PRIMARY KEY,
        name           TEXT        NOT NULL,
        branch_id      TEXT        NOT NULL    REFERENCES Branches(id)
    )";

pub const STUDENTS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Students (
        id                 TEXT        PRIMARY KEY,
        name               TEXT        NOT NULL,
        role               TEXT        NOT NULL,

        college_id         TEXT                    REFERENCES Colleges(id),
        branch_id          TEXT                    REFERENCES Branches(id),
        section_id         TEXT                    REFERENCES Sections(id),

        leetcode_handle    TEXT,
        gfg_handle         TEXT,
        github_handle      TEXT,

        easy_solved        INTEGER     NOT NULL    DEFAULT 0,
        medium_solved      INTEGER     NOT NULL    DEFAULT 0,
        hard_solved        INTEGER     NOT NULL    DEFAULT 0,
        gfg_solved         INTEGER     NOT NULL    DEFAULT 0,
        gfg_coding_score   INTEGER     NOT NULL    DEFAULT 0,
        github_repos       INTEGER     NOT NULL    DEFAULT 0,

        score              INTEGER     NOT NULL    DEFAULT 0
    )";

/// A student's section must sit in their branch, and their branch in their college.
pub const STUDENT_PLACEMENT_TRIGGER: &str =
    "CREATE TRIGGER IF NOT EXISTS StudentPlacement
     BEFORE INSERT ON Students
     WHEN (NEW.section_id IS NOT NULL AND NOT EXISTS (
              SELECT 1 FROM Sections
              WHERE id = NEW.section_id AND branch_id IS NEW.branch_id))
       OR (NEW.branch_id IS NOT NULL AND NOT EXISTS (
              SELECT 1 FROM Branches
              WHERE id = NEW.branch_id AND college_id IS NEW.college_id))
     BEGIN
        SELECT RAISE(ABORT, 'student placement spans more than one college');
     END";

pub const STUDENT_LEADERBOARDS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS StudentLeaderboards (
        scope          TEXT        NOT NULL,
        reference      TEXT        NOT NULL,
        generated_at   TEXT        NOT NULL,
        entries        TEXT        NOT NULL,

        PRIMARY KEY (scope, reference)
    )";

pub const COLLEGE_LEADERBOARDS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS CollegeLeaderboards (
        scope          TEXT        NOT NULL,
        reference      TEXT        NOT NULL,
        generated_at   TEXT        NOT NULL,
        entries        TEXT        NOT NULL,

        PRIMARY KEY (scope, reference)
    )";

pub const RUN_LOCK_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS RunLock (
        name           TEXT        PRIMARY KEY,
        holder         TEXT        NOT NULL,
        acquired_at    TEXT        NOT NULL
    )";

/// Every table (and trigger), in creation order.
pub const TABLES: [(&str, &str); 8] = [
    ("Colleges", COLLEGES_SCHEMA),
    ("Branches", BRANCHES_SCHEMA),
    ("Sections", SECTIONS_SCHEMA),
    ("Students", STUDENTS_SCHEMA),
    ("StudentPlacement", STUDENT_PLACEMENT_TRIGGER),
    ("StudentLeaderboards", STUDENT_LEADERBOARDS_SCHEMA),
    ("CollegeLeaderboards", COLLEGE_LEADERBOARDS_SCHEMA),
    ("RunLock", RUN_LOCK_SCHEMA),
];
