//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `email` is unique; a duplicate insert is reported as `Conflict` even
//!   when the caller did not check beforehand.
//! - Email lookups are exact (case-sensitive, as stored).

use crate::db::UnitOfWork;
use crate::model::user::{NewUser, User};
use crate::model::UserId;
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, email, hashed_password, is_active FROM users";

/// Repository interface for account rows.
pub trait UserRepository {
    /// Inserts one user. Fails with `Conflict` when the email is taken.
    fn create_user(&mut self, user: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository bound to one unit of work.
pub struct SqliteUserRepository<'u, 'conn> {
    uow: &'u mut UnitOfWork<'conn>,
}

impl<'u, 'conn> SqliteUserRepository<'u, 'conn> {
    pub fn new(uow: &'u mut UnitOfWork<'conn>) -> Self {
        Self { uow }
    }
}

impl UserRepository for SqliteUserRepository<'_, '_> {
    fn create_user(&mut self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;

        let inserted = self.uow.atomic(|conn| {
            conn.execute(
                "INSERT INTO users (email, hashed_password, is_active) VALUES (?1, ?2, 1);",
                params![user.email.as_str(), user.password_hash.as_str()],
            )?;
            Ok::<_, RepoError>(conn.last_insert_rowid())
        });

        let id = match inserted {
            Ok(id) => id,
            Err(err) if err.is_unique_violation() => {
                return Err(RepoError::Conflict("email already registered".to_string()));
            }
            Err(err) => return Err(err),
        };

        info!("event=user_create module=repo status=ok user_id={id}");
        load_user(self.uow.connection(), id)?
            .ok_or_else(|| RepoError::InvalidData(format!("user {id} missing after insert")))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        load_user(self.uow.connection(), id)
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = self
            .uow
            .connection()
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1;"),
                [email],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }
}

/// Returns whether a `users` row with `id` exists.
pub(crate) fn user_exists(conn: &Connection, id: UserId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        password_hash: row.get("hashed_password")?,
        is_active: row.get("is_active")?,
    })
}
