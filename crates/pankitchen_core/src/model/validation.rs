//! Input validation errors shared by request shapes.

use super::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected request input. Surfaced to callers as an invalid-argument error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace only.
    BlankField(&'static str),
    /// A user cannot follow themselves.
    SelfFollow(UserId),
    /// Referenced user row does not exist.
    UnknownUser(UserId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::SelfFollow(id) => write!(f, "user {id} cannot follow themselves"),
            Self::UnknownUser(id) => write!(f, "user not found: {id}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}
