//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every repository borrows an explicit `UnitOfWork`; writes run in a
//!   savepoint of it and never leave partial entity graphs behind.
//! - Missing targets are reported as `None`/`false`, never as errors.

pub mod error;
pub mod follow_repo;
pub mod guard;
pub mod like_repo;
pub mod post_repo;
pub mod user_repo;

pub use error::{RepoError, RepoResult};

const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Offset/limit window for list and search calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of rows to skip. Past-the-end offsets yield empty pages.
    pub offset: u32,
    /// Maximum number of rows to return.
    pub limit: u32,
}

impl Page {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Builds a page from optional query parameters, defaulting to `0` and `100`.
    pub fn from_params(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::from_params(None, None)
    }
}
