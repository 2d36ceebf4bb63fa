//! Repository error taxonomy.

use crate::db::{is_unique_violation, DbError};
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by repository operations.
///
/// Absence of a target row is not an error; see the `Option`/`bool`
/// return values on the repository traits.
#[derive(Debug)]
pub enum RepoError {
    /// Input was rejected before touching the store.
    InvalidArgument(ValidationError),
    /// A uniqueness rule was violated where duplication is a genuine error.
    Conflict(String),
    /// Store unreachable, busy, or a statement failed for another reason.
    Db(DbError),
    /// Persisted rows cannot be converted into the read model.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error is a UNIQUE/PRIMARY KEY failure from the store.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Db(DbError::Sqlite(err)) if is_unique_violation(err))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "invalid argument: {err}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::Conflict(_) => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
