//! Post and social-graph use-case service.
//!
//! # Responsibility
//! - Expose one call per post/like/follow use case, each in its own unit
//!   of work.
//! - Enforce post existence and ownership before mutating calls.
//!
//! # Invariants
//! - Only the owner of a post may update or delete it.
//! - Like calls on a missing post fail with `PostNotFound` and write nothing.

use crate::db::{run_in_unit_of_work, UnitOfWork};
use crate::model::post::{NewPost, Post, PostPatch};
use crate::model::social::{Follow, Like, Linked};
use crate::model::{PostId, UserId};
use crate::repo::follow_repo::{FollowRepository, SqliteFollowRepository};
use crate::repo::like_repo::{LikeRepository, SqliteLikeRepository};
use crate::repo::post_repo::{PostRepository, SqlitePostRepository};
use crate::repo::Page;
use crate::service::{ServiceError, ServiceResult};
use log::{debug, warn};
use rusqlite::Connection;

/// Post service over a caller-owned connection.
pub struct PostService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> PostService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    pub fn create_post(&mut self, owner_id: UserId, post: &NewPost) -> ServiceResult<Post> {
        self.run(|uow| Ok(SqlitePostRepository::new(uow).create_post(owner_id, post)?))
    }

    pub fn get_post(&mut self, post_id: PostId) -> ServiceResult<Option<Post>> {
        self.run(|uow| Ok(SqlitePostRepository::new(uow).get_post(post_id)?))
    }

    pub fn list_posts_by_user(&mut self, user_id: UserId, page: Page) -> ServiceResult<Vec<Post>> {
        self.run(|uow| Ok(SqlitePostRepository::new(uow).list_posts_by_user(user_id, page)?))
    }

    pub fn list_all_posts(&mut self, page: Page) -> ServiceResult<Vec<Post>> {
        self.run(|uow| Ok(SqlitePostRepository::new(uow).list_all_posts(page)?))
    }

    pub fn search_posts(&mut self, keyword: &str, page: Page) -> ServiceResult<Vec<Post>> {
        self.run(|uow| Ok(SqlitePostRepository::new(uow).search_posts(keyword, page)?))
    }

    /// Updates a post on behalf of `caller_id`.
    ///
    /// # Errors
    /// - `PostNotFound` when the post does not exist.
    /// - `Forbidden` when `caller_id` is not the owner.
    pub fn update_post_as(
        &mut self,
        caller_id: UserId,
        post_id: PostId,
        patch: &PostPatch,
    ) -> ServiceResult<Post> {
        self.run(|uow| {
            let mut repo = SqlitePostRepository::new(uow);
            require_owner(&repo, caller_id, post_id)?;
            repo.update_post(post_id, patch)?
                .ok_or(ServiceError::PostNotFound(post_id))
        })
    }

    /// Deletes a post on behalf of `caller_id`.
    ///
    /// # Errors
    /// - `PostNotFound` when the post does not exist.
    /// - `Forbidden` when `caller_id` is not the owner.
    pub fn delete_post_as(&mut self, caller_id: UserId, post_id: PostId) -> ServiceResult<()> {
        self.run(|uow| {
            let mut repo = SqlitePostRepository::new(uow);
            require_owner(&repo, caller_id, post_id)?;
            if repo.delete_post(post_id)? {
                Ok(())
            } else {
                Err(ServiceError::PostNotFound(post_id))
            }
        })
    }

    pub fn like_post(&mut self, user_id: UserId, post_id: PostId) -> ServiceResult<Linked<Like>> {
        self.run(|uow| {
            require_post(uow, post_id)?;
            Ok(SqliteLikeRepository::new(uow).add_like(user_id, post_id)?)
        })
    }

    /// Returns `false` when the user had not liked the post.
    pub fn unlike_post(&mut self, user_id: UserId, post_id: PostId) -> ServiceResult<bool> {
        self.run(|uow| {
            require_post(uow, post_id)?;
            Ok(SqliteLikeRepository::new(uow).remove_like(user_id, post_id)?)
        })
    }

    pub fn like_count(&mut self, post_id: PostId) -> ServiceResult<u64> {
        self.run(|uow| {
            require_post(uow, post_id)?;
            Ok(SqliteLikeRepository::new(uow).count_likes(post_id)?)
        })
    }

    pub fn like_status(&mut self, user_id: UserId, post_id: PostId) -> ServiceResult<bool> {
        self.run(|uow| {
            require_post(uow, post_id)?;
            Ok(SqliteLikeRepository::new(uow).has_liked(user_id, post_id)?)
        })
    }

    pub fn follow_user(
        &mut self,
        follower_id: UserId,
        followed_id: UserId,
    ) -> ServiceResult<Linked<Follow>> {
        self.run(|uow| Ok(SqliteFollowRepository::new(uow).add_follow(follower_id, followed_id)?))
    }

    pub fn unfollow_user(&mut self, follower_id: UserId, followed_id: UserId) -> ServiceResult<bool> {
        self.run(|uow| {
            Ok(SqliteFollowRepository::new(uow).remove_follow(follower_id, followed_id)?)
        })
    }

    pub fn follower_count(&mut self, user_id: UserId) -> ServiceResult<u64> {
        self.run(|uow| Ok(SqliteFollowRepository::new(uow).count_followers(user_id)?))
    }

    pub fn following_count(&mut self, user_id: UserId) -> ServiceResult<u64> {
        self.run(|uow| Ok(SqliteFollowRepository::new(uow).count_following(user_id)?))
    }

    pub fn is_following(&mut self, follower_id: UserId, followed_id: UserId) -> ServiceResult<bool> {
        self.run(|uow| {
            Ok(SqliteFollowRepository::new(uow).is_following(follower_id, followed_id)?)
        })
    }

    fn run<T>(
        &mut self,
        work: impl FnOnce(&mut UnitOfWork<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        run_in_unit_of_work(self.conn, work)
    }
}

fn require_post(uow: &mut UnitOfWork<'_>, post_id: PostId) -> ServiceResult<Post> {
    SqlitePostRepository::new(uow)
        .get_post(post_id)?
        .ok_or(ServiceError::PostNotFound(post_id))
}

fn require_owner(
    repo: &SqlitePostRepository<'_, '_>,
    caller_id: UserId,
    post_id: PostId,
) -> ServiceResult<()> {
    let post = repo
        .get_post(post_id)?
        .ok_or(ServiceError::PostNotFound(post_id))?;
    if post.owner_id != caller_id {
        warn!(
            "event=post_ownership module=service status=denied post_id={post_id} caller_id={caller_id}"
        );
        return Err(ServiceError::Forbidden { post_id, caller_id });
    }
    debug!("event=post_ownership module=service status=ok post_id={post_id}");
    Ok(())
}
