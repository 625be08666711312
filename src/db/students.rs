use crate::{
    db::{DBResult, Database},
    models::{self, Counters, Handles, Role},
};

/////*============== STUDENT QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::Student {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let role: String = row.get("role")?;
        let role = role.parse::<Role>().map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, err.into())
        })?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            role,

            college_id: row.get("college_id")?,
            branch_id: row.get("branch_id")?,
            section_id: row.get("section_id")?,

            handles: Handles {
                leetcode: row.get("leetcode_handle")?,
                gfg: row.get("gfg_handle")?,
                github: row.get("github_handle")?,
            },
            counters: Counters {
                easy_solved: row.get("easy_solved")?,
                medium_solved: row.get("medium_solved")?,
                hard_solved: row.get("hard_solved")?,
                gfg_solved: row.get("gfg_solved")?,
                gfg_coding_score: row.get("gfg_coding_score")?,
                github_repos: row.get("github_repos")?,
            },

            score: row.get("score")?,
        })
    }
}

impl Database {
    /// Gathers every account with the `student` role, ordered by id.
    pub fn query_students(&self) -> DBResult<Vec<models::Student>> {
        log::trace!("[query_students] Querying all students.");
        let connection = self.connect();

        let mut stmt = connection
            .prepare("SELECT * FROM Students WHERE role = :role ORDER BY id")?;

        let students = stmt
            .query_map(rusqlite::named_params! { ":role": Role::Student.as_str() }, |row| {
                models::Student::try_from(row)
            })?
            .collect::<DBResult<Vec<models::Student>>>()?;

        Ok(students)
    }

    /// Returns the account with the id `id`, whatever its role, if it exists.
    pub fn query_student(&self, id: &str) -> DBResult<Option<models::Student>> {
        let connection = self.connect();
        connection
            .prepare("SELECT * FROM Students WHERE id = :id")?
            .query(rusqlite::named_params! { ":id": id })?
            .next()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Fails if the student's section and branch are not part of their college.
    pub fn insert_student(&self, student: &models::Student) -> DBResult<()> {
        log::trace!("[insert_student] Inserting student {} into Students...", student.id);

        let query_params = rusqlite::named_params! {
            ":id":               student.id,
            ":name":             student.name,
            ":role":             student.role.as_str(),
            ":college_id":       student.college_id,
            ":branch_id":        student.branch_id,
            ":section_id":       student.section_id,
            ":leetcode_handle":  student.handles.leetcode,
            ":gfg_handle":       student.handles.gfg,
            ":github_handle":    student.handles.github,
            ":easy_solved":      student.counters.easy_solved,
            ":medium_solved":    student.counters.medium_solved,
            ":hard_solved":      student.counters.hard_solved,
            ":gfg_solved":       student.counters.gfg_solved,
            ":gfg_coding_score": student.counters.gfg_coding_score,
            ":github_repos":     student.counters.github_repos,
            ":score":            student.score,
        };

        self.connect()
            .prepare(
                "INSERT INTO Students ( id,  name,  role,  college_id,  branch_id,  section_id,
                                        leetcode_handle,  gfg_handle,  github_handle,
                                        easy_solved,  medium_solved,  hard_solved,
                                        gfg_solved,  gfg_coding_score,  github_repos,  score)
                 VALUES               (:id, :name, :role, :college_id, :branch_id, :section_id,
                                       :leetcode_handle, :gfg_handle, :github_handle,
                                       :easy_solved, :medium_solved, :hard_solved,
                                       :gfg_solved, :gfg_coding_score, :github_repos, :score)",
            )?
            .execute(query_params)
            .inspect_err(|err| {
                log::error!("[insert_student] Could not insert student {}: {err}", student.id)
            })?;

        log::info!("Student {} has been added to the database.", student.id);
        Ok(())
    }

    /// Writes a student's counters and score together in a single statement.
    pub fn update_student_stats(&self, student: &models::Student) -> DBResult<()> {
        let query_params = rusqlite::named_params! {
            ":id":               student.id,
            ":easy_solved":      student.counters.easy_solved,
            ":medium_solved":    student.counters.medium_solved,
            ":hard_solved":      student.counters.hard_solved,
            ":gfg_solved":       student.counters.gfg_solved,
            ":gfg_coding_score": student.counters.gfg_coding_score,
            ":github_repos":     student.counters.github_repos,
            ":score":            student.score,
        };

        let updated = self
            .connect()
            .prepare(
                "UPDATE Students SET
                    easy_solved = :easy_solved,
                    medium_solved = :medium_solved,
                    hard_solved = :hard_solved,
                    gfg_solved = :gfg_solved,
                    gfg_coding_score = :gfg_coding_score,
                    github_repos = :github_repos,
                    score = :score
                 WHERE id = :id",
            )?
            .execute(query_params)
            .inspect_err(|err| {
                log::error!("[update_student_stats] Could not update student {}: {err}", student.id)
            })?;

        match updated {
            0 => Err(rusqlite::Error::QueryReturnedNoRows),
            _ => Ok(()),
        }
    }
}
