//! Entity model for users, bread posts and their social graph.
//!
//! # Responsibility
//! - Define the in-memory shapes read from and written to storage.
//! - Define request shapes (`NewPost`, `PostPatch`, ...) and their validation.
//!
//! # Invariants
//! - Every persisted entity is identified by a store-assigned integer id.
//! - Request shapes must pass `validate()` before any SQL mutation.

pub mod post;
pub mod social;
pub mod user;
pub mod validation;

/// Store-assigned identifier of a `users` row.
pub type UserId = i64;
/// Store-assigned identifier of a `posts` row.
pub type PostId = i64;
/// Store-assigned identifier of a `tags` row.
pub type TagId = i64;
