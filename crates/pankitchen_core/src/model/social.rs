//! Like and follow relationship rows.

use super::{PostId, UserId};
use serde::{Deserialize, Serialize};

/// One user liking one post. `(user_id, post_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: UserId,
    pub post_id: PostId,
}

/// One user following another. `(follower_id, followed_id)` is unique and
/// the two ids always differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub follower_id: UserId,
    pub followed_id: UserId,
}

/// Outcome of an idempotent relationship insert.
///
/// Neither variant is an error: `AlreadyExists` means the relationship was
/// already in the requested state, either before the call or because a
/// concurrent caller inserted it first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linked<T> {
    Created(T),
    AlreadyExists(T),
}

impl<T> Linked<T> {
    /// Returns the relationship row regardless of who created it.
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::AlreadyExists(value) => value,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}
