//! Account use-case service.

use crate::db::run_in_unit_of_work;
use crate::model::user::{NewUser, User};
use crate::model::UserId;
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use crate::service::ServiceResult;
use log::info;
use rusqlite::Connection;

/// Account service over a caller-owned connection.
pub struct UserService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> UserService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Registers a new account.
    ///
    /// # Errors
    /// - `Conflict` when the email is already registered, whether detected
    ///   by the lookup or by the store's unique constraint.
    pub fn register(&mut self, user: &NewUser) -> ServiceResult<User> {
        user.validate().map_err(RepoError::from)?;

        let created = run_in_unit_of_work(self.conn, |uow| {
            let mut repo = SqliteUserRepository::new(uow);
            if repo.get_user_by_email(&user.email)?.is_some() {
                return Err(RepoError::Conflict("email already registered".to_string()));
            }
            repo.create_user(user)
        })?;

        info!("event=user_register module=service status=ok user_id={}", created.id);
        Ok(created)
    }

    pub fn get_user(&mut self, id: UserId) -> ServiceResult<Option<User>> {
        let user = run_in_unit_of_work(self.conn, |uow| {
            SqliteUserRepository::new(uow).get_user(id)
        })?;
        Ok(user)
    }

    pub fn get_user_by_email(&mut self, email: &str) -> ServiceResult<Option<User>> {
        let user = run_in_unit_of_work(self.conn, |uow| {
            SqliteUserRepository::new(uow).get_user_by_email(email)
        })?;
        Ok(user)
    }
}
