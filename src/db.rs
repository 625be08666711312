use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod institutions;
pub mod leaderboards;
pub mod runlock;
pub mod schema;
pub mod students;

pub type DBResult<T> = rusqlite::Result<T>;

/// SQLite-backed store for the college hierarchy, students and leaderboard snapshots.
pub struct Database {
    connection: Mutex<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> DBResult<Self> {
        log::debug!("[open] opening database at {}", path.as_ref().display());
        Self::initialize(Connection::open(path)?)
    }

    pub fn open_in_memory() -> DBResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(connection: Connection) -> DBResult<Self> {
        for (table, ddl) in schema::TABLES {
            log::debug!("[initialize] creating {table}...");
            connection.execute(ddl, [])?;
        }

        Ok(Self { connection: Mutex::new(connection) })
    }

    /// A panic while holding the connection cannot leave SQLite itself in a bad state,
    /// so a poisoned lock is simply taken over.
    pub(crate) fn connect(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maps a UNIQUE/PRIMARY KEY violation to `Ok(false)` ("already there"), passing
/// every other error through.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation => Ok(false),
        err => Err(err),
    }
}

pub(crate) fn to_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn from_timestamp(column: usize, raw: &str) -> DBResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_survive_storage_format() {
        let time = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();
        let raw = to_timestamp(&time);
        assert_eq!(raw, "2026-03-01T08:30:00.000000Z");
        assert_eq!(from_timestamp(0, &raw).unwrap(), time);
    }

    #[test]
    fn bad_timestamp_is_conversion_failure() {
        assert!(matches!(
            from_timestamp(2, "yesterday"),
            Err(rusqlite::Error::FromSqlConversionFailure(2, _, _))
        ));
    }

    #[test]
    fn opens_twice_without_clobbering_schema() {
        let db = Database::open_in_memory().unwrap();
        let connection = db.connect();
        for (_, ddl) in schema::TABLES {
            connection.execute(ddl, []).unwrap();
        }
    }
}
