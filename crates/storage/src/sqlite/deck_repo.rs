use log::debug;
use quiz_core::model::{Deck, DeckId, UserId};

use super::mapping::{deck_id_from_i64, id_to_i64, map_deck_row};
use super::{SqliteRepository, read_error, write_error};
use crate::repository::{DeckRepository, NewDeckRecord, StorageError};

#[async_trait::async_trait]
impl DeckRepository for SqliteRepository {
    async fn insert_new_deck(&self, deck: NewDeckRecord) -> Result<DeckId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO decks (user_id, name, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_to_i64("user_id", deck.user_id.value())?)
        .bind(deck.name)
        .bind(deck.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "deck", "user"))?;

        let id = deck_id_from_i64(res.last_insert_rowid())?;
        debug!("stored deck {id} for user {}", deck.user_id);
        Ok(id)
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError> {
        let row = sqlx::query("SELECT id, user_id, name, created_at FROM decks WHERE id = ?1")
            .bind(id_to_i64("deck_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)?;

        row.as_ref().map(map_deck_row).transpose()
    }

    async fn find_deck_by_name(&self, name: &str, user_id: UserId) -> Result<Deck, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, created_at
            FROM decks
            WHERE name = ?1 AND user_id = ?2
            ",
        )
        .bind(name)
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error)?;

        match row {
            Some(row) => map_deck_row(&row),
            None => Err(StorageError::NotFound { entity: "deck" }),
        }
    }

    async fn list_decks_by_user(&self, user_id: UserId) -> Result<Vec<Deck>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, created_at
            FROM decks
            WHERE user_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error)?;

        rows.iter().map(map_deck_row).collect()
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM decks WHERE id = ?1")
            .bind(id_to_i64("deck_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(read_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "deck" });
        }
        debug!("deleted deck {id}");
        Ok(())
    }

    async fn next_round(&self, id: DeckId) -> Result<u32, StorageError> {
        let round: Option<i64> = sqlx::query_scalar("SELECT next_round FROM decks WHERE id = ?1")
            .bind(id_to_i64("deck_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)?;

        let round = round.ok_or(StorageError::NotFound { entity: "deck" })?;
        u32::try_from(round)
            .map_err(|_| StorageError::Serialization(format!("invalid next_round: {round}")))
    }

    async fn set_next_round(&self, id: DeckId, round: u32) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE decks SET next_round = ?1 WHERE id = ?2")
            .bind(i64::from(round))
            .bind(id_to_i64("deck_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(read_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "deck" });
        }
        debug!("deck {id} continues at round {round}");
        Ok(())
    }
}
