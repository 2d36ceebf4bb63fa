//! Keyword search entry points.
//!
//! # Responsibility
//! - Compose the multi-table post keyword query.
//! - Keep matching rules (case folding, empty keyword) inside core.

pub mod post_search;
