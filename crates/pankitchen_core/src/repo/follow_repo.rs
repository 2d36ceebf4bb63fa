//! Follow repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(follower_id, followed_id)` is unique; `add_follow` is idempotent.
//! - Self-follow is rejected before any store interaction.
//! - `remove_follow` on a missing pair performs no write.

use crate::db::UnitOfWork;
use crate::model::social::{Follow, Linked};
use crate::model::validation::ValidationError;
use crate::model::UserId;
use crate::repo::guard::link_once;
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for follow relationships.
pub trait FollowRepository {
    fn add_follow(&mut self, follower_id: UserId, followed_id: UserId)
        -> RepoResult<Linked<Follow>>;
    fn remove_follow(&mut self, follower_id: UserId, followed_id: UserId) -> RepoResult<bool>;
    /// Number of users following `user_id`.
    fn count_followers(&self, user_id: UserId) -> RepoResult<u64>;
    /// Number of users `user_id` follows.
    fn count_following(&self, user_id: UserId) -> RepoResult<u64>;
    fn is_following(&self, follower_id: UserId, followed_id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed follow repository bound to one unit of work.
pub struct SqliteFollowRepository<'u, 'conn> {
    uow: &'u mut UnitOfWork<'conn>,
}

impl<'u, 'conn> SqliteFollowRepository<'u, 'conn> {
    pub fn new(uow: &'u mut UnitOfWork<'conn>) -> Self {
        Self { uow }
    }

    fn count_where(&self, column: FollowColumn, user_id: UserId) -> RepoResult<u64> {
        let count: i64 = self.uow.connection().query_row(
            &format!("SELECT COUNT(*) FROM follows WHERE {} = ?1;", column.as_str()),
            [user_id],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative follow count `{count}`")))
    }
}

impl FollowRepository for SqliteFollowRepository<'_, '_> {
    fn add_follow(
        &mut self,
        follower_id: UserId,
        followed_id: UserId,
    ) -> RepoResult<Linked<Follow>> {
        if follower_id == followed_id {
            return Err(ValidationError::SelfFollow(follower_id).into());
        }

        link_once(
            self.uow,
            "follow",
            |conn| find_follow(conn, follower_id, followed_id),
            |conn| {
                conn.execute(
                    "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2);",
                    params![follower_id, followed_id],
                )?;
                Ok(Follow {
                    id: conn.last_insert_rowid(),
                    follower_id,
                    followed_id,
                })
            },
        )
    }

    fn remove_follow(&mut self, follower_id: UserId, followed_id: UserId) -> RepoResult<bool> {
        let removed = self.uow.atomic(|conn| {
            let Some(follow) = find_follow(conn, follower_id, followed_id)? else {
                return Ok::<_, RepoError>(false);
            };
            conn.execute("DELETE FROM follows WHERE id = ?1;", [follow.id])?;
            Ok(true)
        })?;

        if removed {
            info!(
                "event=follow_remove module=repo status=ok follower_id={follower_id} followed_id={followed_id}"
            );
        }
        Ok(removed)
    }

    fn count_followers(&self, user_id: UserId) -> RepoResult<u64> {
        self.count_where(FollowColumn::Followed, user_id)
    }

    fn count_following(&self, user_id: UserId) -> RepoResult<u64> {
        self.count_where(FollowColumn::Follower, user_id)
    }

    fn is_following(&self, follower_id: UserId, followed_id: UserId) -> RepoResult<bool> {
        Ok(find_follow(self.uow.connection(), follower_id, followed_id)?.is_some())
    }
}

#[derive(Debug, Clone, Copy)]
enum FollowColumn {
    Follower,
    Followed,
}

impl FollowColumn {
    fn as_str(self) -> &'static str {
        match self {
            Self::Follower => "follower_id",
            Self::Followed => "followed_id",
        }
    }
}

fn find_follow(
    conn: &Connection,
    follower_id: UserId,
    followed_id: UserId,
) -> RepoResult<Option<Follow>> {
    let follow = conn
        .query_row(
            "SELECT id, follower_id, followed_id
             FROM follows
             WHERE follower_id = ?1 AND followed_id = ?2;",
            params![follower_id, followed_id],
            |row| {
                Ok(Follow {
                    id: row.get("id")?,
                    follower_id: row.get("follower_id")?,
                    followed_id: row.get("followed_id")?,
                })
            },
        )
        .optional()?;
    Ok(follow)
}
