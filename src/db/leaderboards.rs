use serde::{Serialize, de::DeserializeOwned};

use crate::{
    db::{self, DBResult, Database},
    models::{CollegeEntry, Family, Scope, Snapshot, StudentEntry},
};

/////*============== LEADERBOARD SNAPSHOTS ==============*/
fn table(family: Family) -> &'static str {
    match family {
        Family::Students => "StudentLeaderboards",
        Family::Colleges => "CollegeLeaderboards",
    }
}

impl Database {
    /// Replaces the student snapshot for its (scope, reference), creating it if absent.
    pub fn upsert_student_leaderboard(&self, snapshot: &Snapshot<StudentEntry>) -> DBResult<()> {
        self.upsert_snapshot(Family::Students, snapshot)
    }

    /// Replaces the college snapshot for its (scope, reference), creating it if absent.
    pub fn upsert_college_leaderboard(&self, snapshot: &Snapshot<CollegeEntry>) -> DBResult<()> {
        self.upsert_snapshot(Family::Colleges, snapshot)
    }

    pub fn query_student_leaderboard(
        &self,
        scope: Scope,
        reference: &str,
    ) -> DBResult<Option<Snapshot<StudentEntry>>> {
        self.query_snapshot(Family::Students, scope, reference)
    }

    pub fn query_college_leaderboard(
        &self,
        scope: Scope,
        reference: &str,
    ) -> DBResult<Option<Snapshot<CollegeEntry>>> {
        self.query_snapshot(Family::Colleges, scope, reference)
    }

    /// Lists the references that currently have a snapshot in `scope`.
    pub fn query_leaderboard_references(
        &self,
        family: Family,
        scope: Scope,
    ) -> DBResult<Vec<String>> {
        let connection = self.connect();
        let mut stmt = connection.prepare(&format!(
            "SELECT reference FROM {} WHERE scope = :scope ORDER BY reference",
            table(family)
        ))?;

        let references = stmt
            .query_map(rusqlite::named_params! { ":scope": scope.as_str() }, |row| row.get(0))?
            .collect::<DBResult<Vec<String>>>()?;

        Ok(references)
    }

    fn upsert_snapshot<E: Serialize>(&self, family: Family, snapshot: &Snapshot<E>) -> DBResult<()> {
        log::trace!(
            "[upsert_snapshot] Writing {} {} leaderboard for {} ({} entries)",
            table(family),
            snapshot.scope,
            snapshot.reference,
            snapshot.entries.len()
        );

        let entries = serde_json::to_string(&snapshot.entries)
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;

        let query_params = rusqlite::named_params! {
            ":scope":        snapshot.scope.as_str(),
            ":reference":    snapshot.reference,
            ":generated_at": db::to_timestamp(&snapshot.generated_at),
            ":entries":      entries,
        };

        self.connect()
            .prepare(&format!(
                "INSERT INTO {} ( scope,  reference,  generated_at,  entries)
                 VALUES         (:scope, :reference, :generated_at, :entries)
                 ON CONFLICT (scope, reference) DO UPDATE SET
                    generated_at = excluded.generated_at,
                    entries = excluded.entries",
                table(family)
            ))?
            .execute(query_params)
            .inspect_err(|err| {
                log::error!(
                    "[upsert_snapshot] Could not write {} leaderboard for {}: {err}",
                    snapshot.scope,
                    snapshot.reference
                )
            })?;

        Ok(())
    }

    fn query_snapshot<E: DeserializeOwned>(
        &self,
        family: Family,
        scope: Scope,
        reference: &str,
    ) -> DBResult<Option<Snapshot<E>>> {
        let connection = self.connect();
        let mut stmt = connection.prepare(&format!(
            "SELECT generated_at, entries FROM {}
             WHERE scope = :scope AND reference = :reference",
            table(family)
        ))?;

        let mut rows = stmt.query(rusqlite::named_params! {
            ":scope": scope.as_str(),
            ":reference": reference,
        })?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let generated_at: String = row.get("generated_at")?;
        let entries: String = row.get("entries")?;

        Ok(Some(Snapshot {
            scope,
            reference: reference.to_string(),
            generated_at: db::from_timestamp(0, &generated_at)?,
            entries: serde_json::from_str(&entries).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(err),
                )
            })?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Counters, PlatformTotals};
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, score: u64, rank: usize) -> StudentEntry {
        StudentEntry {
            student_id: id.to_string(),
            name: id.to_uppercase(),
            score,
            counters: Counters::default(),
            college_id: Some(String::from("c1")),
            branch_id: None,
            section_id: None,
            rank,
        }
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.query_student_leaderboard(Scope::College, "c1").unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_previous_snapshot() {
        let db = Database::open_in_memory().unwrap();
        let first = Snapshot {
            scope: Scope::College,
            reference: String::from("c1"),
            generated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            entries: vec![entry("a", 900, 1), entry("b", 400, 2), entry("c", 100, 3)],
        };
        db.upsert_student_leaderboard(&first).unwrap();

        let second = Snapshot {
            generated_at: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
            entries: vec![entry("b", 1200, 1)],
            ..first.clone()
        };
        db.upsert_student_leaderboard(&second).unwrap();

        let stored = db.query_student_leaderboard(Scope::College, "c1").unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[test]
    fn families_do_not_collide() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        db.upsert_student_leaderboard(&Snapshot {
            scope: Scope::City,
            reference: String::from("Pune"),
            generated_at: now,
            entries: vec![entry("a", 10, 1)],
        })
        .unwrap();

        assert!(db.query_college_leaderboard(Scope::City, "Pune").unwrap().is_none());

        db.upsert_college_leaderboard(&Snapshot {
            scope: Scope::City,
            reference: String::from("Pune"),
            generated_at: now,
            entries: vec![CollegeEntry {
                college_id: String::from("c1"),
                name: String::from("College One"),
                city: String::from("Pune"),
                state: String::from("Maharashtra"),
                total_students: 1,
                total_score: 10,
                average_score: 10,
                top_performers: 0,
                totals: PlatformTotals::default(),
                averages: PlatformTotals::default(),
                rank: 1,
            }],
        })
        .unwrap();

        let colleges = db.query_college_leaderboard(Scope::City, "Pune").unwrap().unwrap();
        assert_eq!(colleges.entries.len(), 1);
        assert_eq!(
            db.query_leaderboard_references(Family::Students, Scope::City).unwrap(),
            vec!["Pune"]
        );
    }
}
