use std::sync::Arc;

use log::info;
use quiz_core::model::{User, UserId};
use storage::repository::{NewUserRecord, StorageError, UserRepository};

use crate::Clock;
use crate::error::UserServiceError;

/// Registers and looks up users.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Validate and persist a new user.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for blank input.
    /// Returns `UserServiceError::Storage` (`Conflict`) if the username is taken.
    pub async fn register(&self, username: &str, name: &str) -> Result<UserId, UserServiceError> {
        let user = User::new(UserId::new(0), username, name, self.clock.now())?;
        let id = self
            .users
            .insert_new_user(NewUserRecord::from_user(&user))
            .await?;
        info!("registered user {} as {id}", user.username());
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.find_user_by_username(username.trim()).await?)
    }

    /// Like `find_by_username` but a missing user is an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) if no such user exists.
    pub async fn require_user(&self, username: &str) -> Result<User, UserServiceError> {
        self.find_by_username(username)
            .await?
            .ok_or(UserServiceError::Storage(StorageError::NotFound { entity: "user" }))
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.get_user(id).await?)
    }

    /// Delete a user and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` (`NotFound`) if the user is missing.
    pub async fn delete_user(&self, id: UserId) -> Result<(), UserServiceError> {
        self.users.delete_user(id).await?;
        info!("deleted user {id}");
        Ok(())
    }
}
