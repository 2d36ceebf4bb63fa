//! Like repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(user_id, post_id)` is unique; `add_like` is idempotent.
//! - `remove_like` on a missing pair performs no write.

use crate::db::UnitOfWork;
use crate::model::social::{Like, Linked};
use crate::model::{PostId, UserId};
use crate::repo::guard::link_once;
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for likes.
pub trait LikeRepository {
    fn add_like(&mut self, user_id: UserId, post_id: PostId) -> RepoResult<Linked<Like>>;
    fn remove_like(&mut self, user_id: UserId, post_id: PostId) -> RepoResult<bool>;
    fn count_likes(&self, post_id: PostId) -> RepoResult<u64>;
    fn has_liked(&self, user_id: UserId, post_id: PostId) -> RepoResult<bool>;
}

/// SQLite-backed like repository bound to one unit of work.
pub struct SqliteLikeRepository<'u, 'conn> {
    uow: &'u mut UnitOfWork<'conn>,
}

impl<'u, 'conn> SqliteLikeRepository<'u, 'conn> {
    pub fn new(uow: &'u mut UnitOfWork<'conn>) -> Self {
        Self { uow }
    }
}

impl LikeRepository for SqliteLikeRepository<'_, '_> {
    fn add_like(&mut self, user_id: UserId, post_id: PostId) -> RepoResult<Linked<Like>> {
        link_once(
            self.uow,
            "like",
            |conn| find_like(conn, user_id, post_id),
            |conn| {
                conn.execute(
                    "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2);",
                    params![user_id, post_id],
                )?;
                Ok(Like {
                    id: conn.last_insert_rowid(),
                    user_id,
                    post_id,
                })
            },
        )
    }

    fn remove_like(&mut self, user_id: UserId, post_id: PostId) -> RepoResult<bool> {
        let removed = self.uow.atomic(|conn| {
            let Some(like) = find_like(conn, user_id, post_id)? else {
                return Ok::<_, RepoError>(false);
            };
            conn.execute("DELETE FROM likes WHERE id = ?1;", [like.id])?;
            Ok(true)
        })?;

        if removed {
            info!("event=like_remove module=repo status=ok user_id={user_id} post_id={post_id}");
        }
        Ok(removed)
    }

    fn count_likes(&self, post_id: PostId) -> RepoResult<u64> {
        let count: i64 = self.uow.connection().query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1;",
            [post_id],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative like count `{count}`")))
    }

    fn has_liked(&self, user_id: UserId, post_id: PostId) -> RepoResult<bool> {
        Ok(find_like(self.uow.connection(), user_id, post_id)?.is_some())
    }
}

fn find_like(conn: &Connection, user_id: UserId, post_id: PostId) -> RepoResult<Option<Like>> {
    let like = conn
        .query_row(
            "SELECT id, user_id, post_id
             FROM likes
             WHERE user_id = ?1 AND post_id = ?2;",
            params![user_id, post_id],
            |row| {
                Ok(Like {
                    id: row.get("id")?,
                    user_id: row.get("user_id")?,
                    post_id: row.get("post_id")?,
                })
            },
        )
        .optional()?;
    Ok(like)
}
