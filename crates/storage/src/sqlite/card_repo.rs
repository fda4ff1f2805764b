use log::debug;
use quiz_core::model::{CardId, DeckId, QuizCard};

use super::mapping::{card_id_from_i64, encode_false_answers, id_to_i64, map_card_row};
use super::{SqliteRepository, read_error, write_error};
use crate::repository::{CardRepository, NewCardRecord, StorageError};

#[async_trait::async_trait]
impl CardRepository for SqliteRepository {
    async fn insert_new_card(&self, card: NewCardRecord) -> Result<CardId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO quiz_cards (deck_id, question, correct_answer, false_answers, box_number, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            ",
        )
        .bind(id_to_i64("deck_id", card.deck_id.value())?)
        .bind(card.question)
        .bind(card.correct_answer)
        .bind(encode_false_answers(&card.false_answers)?)
        .bind(card.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "card", "deck"))?;

        let id = card_id_from_i64(res.last_insert_rowid())?;
        debug!("stored card {id} in deck {}", card.deck_id);
        Ok(id)
    }

    async fn get_card(&self, id: CardId) -> Result<Option<QuizCard>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, deck_id, question, correct_answer, false_answers, box_number, created_at
            FROM quiz_cards
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("card_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error)?;

        row.as_ref().map(map_card_row).transpose()
    }

    async fn cards_by_deck(&self, deck_id: DeckId) -> Result<Vec<QuizCard>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, deck_id, question, correct_answer, false_answers, box_number, created_at
            FROM quiz_cards
            WHERE deck_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("deck_id", deck_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error)?;

        rows.iter().map(map_card_row).collect()
    }

    async fn update_card_box(&self, id: CardId, box_number: u32) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE quiz_cards SET box_number = ?1 WHERE id = ?2")
            .bind(i64::from(box_number))
            .bind(id_to_i64("card_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(read_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "card" });
        }
        debug!("card {id} moved to box {box_number}");
        Ok(())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quiz_cards WHERE id = ?1")
            .bind(id_to_i64("card_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(read_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "card" });
        }
        Ok(())
    }
}
