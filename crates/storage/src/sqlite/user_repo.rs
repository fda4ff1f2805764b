use log::debug;
use quiz_core::model::{User, UserId};

use super::mapping::{id_to_i64, map_user_row, user_id_from_i64};
use super::{SqliteRepository, read_error, write_error};
use crate::repository::{NewUserRecord, StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_new_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (username, name, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(user.username)
        .bind(user.name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "user", "user"))?;

        let id = user_id_from_i64(res.last_insert_rowid())?;
        debug!("stored user {id}");
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT id, username, name, created_at FROM users WHERE id = ?1")
            .bind(id_to_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let row =
            sqlx::query("SELECT id, username, name, created_at FROM users WHERE username = ?1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(read_error)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id_to_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(read_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "user" });
        }
        debug!("deleted user {id}");
        Ok(())
    }
}
