//! Service error taxonomy.

use crate::db::DbError;
use crate::model::{PostId, UserId};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by use-case services.
#[derive(Debug)]
pub enum ServiceError {
    /// Target post does not exist.
    PostNotFound(PostId),
    /// Caller is not the owner of the target post.
    Forbidden { post_id: PostId, caller_id: UserId },
    /// Repository-level failure, including conflicts and invalid input.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostNotFound(id) => write!(f, "post not found: {id}"),
            Self::Forbidden { post_id, caller_id } => {
                write!(f, "user {caller_id} does not own post {post_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}
