//! Idempotent insert protocol for unique relationship rows.
//!
//! # Responsibility
//! - Turn "insert if absent" on a UNIQUE pair into a call that never fails
//!   merely because the pair already exists.
//!
//! # Invariants
//! - An existing row is returned as `Linked::AlreadyExists`, not as an error.
//! - A UNIQUE violation on insert (a concurrent writer won the race) is
//!   rolled back to the operation savepoint and reported the same way.
//! - Any other failure propagates unchanged.

use crate::db::UnitOfWork;
use crate::model::social::Linked;
use crate::repo::{RepoError, RepoResult};
use log::{debug, warn};
use rusqlite::Connection;

/// Inserts a relationship row once.
///
/// `find` looks the row up; `insert` creates it and returns the new row.
pub fn link_once<T>(
    uow: &mut UnitOfWork<'_>,
    relation: &'static str,
    find: impl Fn(&Connection) -> RepoResult<Option<T>>,
    insert: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<Linked<T>> {
    if let Some(existing) = find(uow.connection())? {
        debug!("event=link module=repo status=exists relation={relation}");
        return Ok(Linked::AlreadyExists(existing));
    }

    match uow.atomic(insert) {
        Ok(created) => {
            debug!("event=link module=repo status=created relation={relation}");
            Ok(Linked::Created(created))
        }
        Err(err) if err.is_unique_violation() => {
            warn!("event=link module=repo status=race_recovered relation={relation}");
            let existing = find(uow.connection())?.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "{relation} insert hit a unique violation but no row is visible"
                ))
            })?;
            Ok(Linked::AlreadyExists(existing))
        }
        Err(err) => Err(err),
    }
}
