//! Explicit unit-of-work handle threaded through every repository call.
//!
//! # Responsibility
//! - Own one SQLite transaction for the lifetime of a logical request.
//! - Scope each repository operation in a savepoint so a failed operation
//!   leaves no partial rows behind.
//!
//! # Invariants
//! - Dropping a `UnitOfWork` without `commit()` rolls back every write.
//! - A failed `atomic` block is rolled back to its savepoint before the
//!   error is returned.

use super::{DbError, DbResult};
use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::ops::Deref;

/// One atomic group of reads and writes.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> UnitOfWork<'conn> {
    /// Begins a unit of work holding the database write lock.
    ///
    /// `IMMEDIATE` makes concurrent writers queue on the busy timeout
    /// instead of failing at their first write.
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self { tx })
    }

    /// Commits all writes made through this unit of work.
    pub fn commit(self) -> DbResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    /// Discards all writes made through this unit of work.
    pub fn rollback(self) -> DbResult<()> {
        self.tx.rollback()?;
        Ok(())
    }

    /// Read access to the underlying transaction.
    pub fn connection(&self) -> &Connection {
        &self.tx
    }

    /// Runs `op` inside a savepoint.
    ///
    /// The savepoint is released on `Ok` and rolled back on `Err`.
    pub fn atomic<T, E>(&mut self, op: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let savepoint = self.tx.savepoint()?;
        let value = op(&savepoint)?;
        savepoint.commit()?;
        Ok(value)
    }
}

impl Deref for UnitOfWork<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

/// Runs `work` in a fresh unit of work on `conn`.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
pub fn run_in_unit_of_work<T, E>(
    conn: &mut Connection,
    work: impl FnOnce(&mut UnitOfWork<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<DbError>,
{
    let mut uow = UnitOfWork::begin(conn)?;
    match work(&mut uow) {
        Ok(value) => {
            uow.commit()?;
            debug!("event=uow_commit module=db status=ok");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback() {
                warn!(
                    "event=uow_rollback module=db status=error error={}",
                    rollback_err
                );
            } else {
                debug!("event=uow_rollback module=db status=ok");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run_in_unit_of_work, UnitOfWork};
    use crate::db::{open_db_in_memory, DbError};

    fn user_count(conn: &rusqlite::Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn dropped_unit_of_work_rolls_back() {
        let mut conn = open_db_in_memory().unwrap();
        {
            let uow = UnitOfWork::begin(&mut conn).unwrap();
            uow.execute(
                "INSERT INTO users (email, hashed_password) VALUES ('a@b.c', 'h');",
                [],
            )
            .unwrap();
        }
        assert_eq!(user_count(&conn), 0);
    }

    #[test]
    fn failed_atomic_block_keeps_earlier_writes() {
        let mut conn = open_db_in_memory().unwrap();
        let mut uow = UnitOfWork::begin(&mut conn).unwrap();
        uow.execute(
            "INSERT INTO users (email, hashed_password) VALUES ('kept@b.c', 'h');",
            [],
        )
        .unwrap();

        let result: Result<(), rusqlite::Error> = uow.atomic(|conn| {
            conn.execute(
                "INSERT INTO users (email, hashed_password) VALUES ('gone@b.c', 'h');",
                [],
            )?;
            conn.execute(
                "INSERT INTO users (email, hashed_password) VALUES ('kept@b.c', 'h');",
                [],
            )?;
            Ok(())
        });
        assert!(result.is_err());
        uow.commit().unwrap();

        assert_eq!(user_count(&conn), 1);
    }

    #[test]
    fn run_in_unit_of_work_rolls_back_on_error() {
        let mut conn = open_db_in_memory().unwrap();
        let result: Result<(), DbError> = run_in_unit_of_work(&mut conn, |uow| {
            uow.execute(
                "INSERT INTO users (email, hashed_password) VALUES ('a@b.c', 'h');",
                [],
            )?;
            Err(DbError::UnsupportedSchemaVersion {
                db_version: 0,
                latest_supported: 0,
            })
        });
        assert!(result.is_err());
        assert_eq!(user_count(&conn), 0);
    }
}
