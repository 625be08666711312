use crate::{
    db::{DBResult, Database},
    models,
};

/////*============== INSTITUTION QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::College {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            city: row.get("city")?,
            state: row.get("state")?,
        })
    }
}

impl Database {
    /// Gathers all colleges, ordered by id.
    pub fn query_colleges(&self) -> DBResult<Vec<models::College>> {
        log::trace!("[query_colleges] Querying all colleges.");
        let connection = self.connect();

        let mut stmt = connection.prepare("SELECT * FROM Colleges ORDER BY id")?;
        let colleges = stmt
            .query_map([], |row| models::College::try_from(row))?
            .collect::<DBResult<Vec<models::College>>>()?;

        Ok(colleges)
    }

    /// Inserts the college, or does nothing if one with the same id already exists.
    /// Returns `true` if it was newly added, false otherwise.
    pub fn insert_college(&self, college: &models::College) -> DBResult<bool> {
        log::trace!("[insert_college] Inserting college {} into Colleges...", college.id);

        let query_params = rusqlite::named_params! {
            ":id":    college.id,
            ":name":  college.name,
            ":city":  college.city,
            ":state": college.state,
        };

        self.connect()
            .prepare(
                "INSERT INTO Colleges ( id,  name,  city,  state)
                 VALUES               (:id, :name, :city, :state)",
            )?
            .execute(query_params)
            .map_or_else(crate::db::swallow_constraint_violation, |_| Ok(true))
    }

    /// Returns `true` if it was newly added, false otherwise.
    pub fn insert_branch(&self, branch: &models::Branch) -> DBResult<bool> {
        log::trace!("[insert_branch] Inserting branch {} into Branches...", branch.id);

        let query_params = rusqlite::named_params! {
            ":id":         branch.id,
            ":name":       branch.name,
            ":college_id": branch.college_id,
        };

        self.connect()
            .prepare(
                "INSERT INTO Branches ( id,  name,  college_id)
                 VALUES               (:id, :name, :college_id)",
            )?
            .execute(query_params)
            .map_or_else(crate::db::swallow_constraint_violation, |_| Ok(true))
    }

    /// Returns `true` if it was newly added, false otherwise.
    pub fn insert_section(&self, section: &models::Section) -> DBResult<bool> {
        log::trace!("[insert_section] Inserting section {} into Sections...", section.id);

        let query_params = rusqlite::named_params! {
            ":id":        section.id,
            ":name":      section.name,
            ":branch_id": section.branch_id,
        };

        self.connect()
            .prepare(
                "INSERT INTO Sections ( id,  name,  branch_id)
                 VALUES               (:id, :name, :branch_id)",
            )?
            .execute(query_params)
            .map_or_else(crate::db::swallow_constraint_violation, |_| Ok(true))
    }
}
