//! Core data layer for Pankitchen, a bread-baking post sharing backend.
//! This crate is the single source of truth for entity invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{
    open_db, open_db_from_config, open_db_in_memory, run_in_unit_of_work, DbError, UnitOfWork,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::post::{
    NewPhoto, NewPost, NewRecipe, Photo, Post, PostPatch, Recipe, RecipePatch, Tag,
};
pub use model::social::{Follow, Like, Linked};
pub use model::user::{NewUser, User};
pub use model::validation::ValidationError;
pub use model::{PostId, TagId, UserId};
pub use repo::follow_repo::{FollowRepository, SqliteFollowRepository};
pub use repo::like_repo::{LikeRepository, SqliteLikeRepository};
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{Page, RepoError, RepoResult};
pub use service::post_service::PostService;
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
