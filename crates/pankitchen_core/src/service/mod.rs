//! Core use-case services.
//!
//! # Responsibility
//! - Run each use case in its own unit of work over a caller-owned connection.
//! - Apply the existence and ownership checks the transport layer relies on.

pub mod error;
pub mod post_service;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};
