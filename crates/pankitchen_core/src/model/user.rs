//! User account model.

use super::validation::{require_text, ValidationError};
use super::UserId;
use serde::{Deserialize, Serialize};

/// Registered account.
///
/// `email` is unique across users and compared exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Opaque hash produced by the authentication collaborator.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("email", &self.email)?;
        require_text("password_hash", &self.password_hash)?;
        Ok(())
    }
}
