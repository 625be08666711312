use chrono::{DateTime, Utc};

use crate::db::{self, DBResult, Database};

const PIPELINE_LOCK: &str = "pipeline";

/////*============== RUN LOCK ==============*/
impl Database {
    /// Attempts to take the pipeline lock for `holder`.
    ///
    /// A lock held for longer than `ttl` is considered abandoned and is taken over.
    /// Returns `true` if the lock is now held by `holder`, false if another run holds it.
    pub fn try_acquire_run_lock(
        &self,
        holder: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> DBResult<bool> {
        let mut connection = self.connect();
        let tx = connection.transaction()?;

        let stale = tx.execute(
            "DELETE FROM RunLock WHERE name = :name AND acquired_at < :cutoff",
            rusqlite::named_params! {
                ":name": PIPELINE_LOCK,
                ":cutoff": db::to_timestamp(&(now - ttl)),
            },
        )?;
        if stale > 0 {
            log::warn!("[try_acquire_run_lock] Took over a stale pipeline lock.");
        }

        let acquired = tx
            .execute(
                "INSERT INTO RunLock (name, holder, acquired_at)
                 VALUES (:name, :holder, :acquired_at)",
                rusqlite::named_params! {
                    ":name": PIPELINE_LOCK,
                    ":holder": holder,
                    ":acquired_at": db::to_timestamp(&now),
                },
            )
            .map_or_else(db::swallow_constraint_violation, |_| Ok(true))?;

        tx.commit()?;
        Ok(acquired)
    }

    /// Releases the pipeline lock if `holder` owns it. Returns whether anything was released.
    pub fn release_run_lock(&self, holder: &str) -> DBResult<bool> {
        let released = self.connect().execute(
            "DELETE FROM RunLock WHERE name = :name AND holder = :holder",
            rusqlite::named_params! { ":name": PIPELINE_LOCK, ":holder": holder },
        )?;

        Ok(released > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn second_holder_is_refused() {
        let db = Database::open_in_memory().unwrap();
        let ttl = chrono::Duration::hours(6);

        assert!(db.try_acquire_run_lock("run-a", at(1), ttl).unwrap());
        assert!(!db.try_acquire_run_lock("run-b", at(2), ttl).unwrap());

        assert!(!db.release_run_lock("run-b").unwrap());
        assert!(db.release_run_lock("run-a").unwrap());
        assert!(db.try_acquire_run_lock("run-b", at(3), ttl).unwrap());
    }

    #[test]
    fn stale_lock_is_taken_over() {
        let db = Database::open_in_memory().unwrap();
        let ttl = chrono::Duration::hours(2);

        assert!(db.try_acquire_run_lock("crashed", at(1), ttl).unwrap());
        assert!(db.try_acquire_run_lock("fresh", at(4), ttl).unwrap());
        assert!(!db.release_run_lock("crashed").unwrap());
    }
}
