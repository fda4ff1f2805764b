use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use quiz_core::model::{CardId, DeckId, QuizCard, QuizCardDraft};
use storage::repository::{CardRepository, NewCardRecord};

use crate::Clock;
use crate::error::CardServiceError;

/// Orchestrates card creation and persistence.
#[derive(Clone)]
pub struct CardService {
    clock: Clock,
    cards: Arc<dyn CardRepository>,
}

/// Card counts for a deck, grouped by box.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeckBoxStats {
    pub total: u32,
    pub per_box: BTreeMap<u32, u32>,
}

impl DeckBoxStats {
    #[must_use]
    pub fn in_box(&self, box_number: u32) -> u32 {
        self.per_box.get(&box_number).copied().unwrap_or(0)
    }
}

impl CardService {
    #[must_use]
    pub fn new(clock: Clock, cards: Arc<dyn CardRepository>) -> Self {
        Self { clock, cards }
    }

    /// Validate a new card and persist it in box 0.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Card` for validation failures.
    /// Returns `CardServiceError::Storage` if the deck does not exist
    /// (`NotFound`) or persistence fails.
    pub async fn create_card<S: Into<String>>(
        &self,
        deck_id: DeckId,
        question: &str,
        correct_answer: &str,
        false_answers: impl IntoIterator<Item = S>,
    ) -> Result<CardId, CardServiceError> {
        let draft = QuizCardDraft::new(deck_id, question, correct_answer, false_answers);
        self.create_from_draft(draft).await
    }

    /// # Errors
    ///
    /// See [`create_card`](Self::create_card).
    pub async fn create_from_draft(&self, draft: QuizCardDraft) -> Result<CardId, CardServiceError> {
        let deck_id = draft.deck_id;
        let card = draft.validate(self.clock.now())?;
        let card_id = self.cards.insert_new_card(NewCardRecord::from(card)).await?;
        debug!("created card {card_id} in deck {deck_id}");
        Ok(card_id)
    }

    /// All cards of a deck, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn cards_in_deck(&self, deck_id: DeckId) -> Result<Vec<QuizCard>, CardServiceError> {
        Ok(self.cards.cards_by_deck(deck_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn cards_in_box(
        &self,
        deck_id: DeckId,
        box_number: u32,
    ) -> Result<Vec<QuizCard>, CardServiceError> {
        let cards = self.cards.cards_by_deck(deck_id).await?;
        Ok(cards
            .into_iter()
            .filter(|c| c.box_number() == box_number)
            .collect())
    }

    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn box_stats(&self, deck_id: DeckId) -> Result<DeckBoxStats, CardServiceError> {
        let cards = self.cards.cards_by_deck(deck_id).await?;
        let mut stats = DeckBoxStats::default();
        for card in &cards {
            stats.total += 1;
            *stats.per_box.entry(card.box_number()).or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn get_card(&self, card_id: CardId) -> Result<Option<QuizCard>, CardServiceError> {
        Ok(self.cards.get_card(card_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` (`NotFound`) if the card is missing.
    pub async fn delete_card(&self, card_id: CardId) -> Result<(), CardServiceError> {
        self.cards.delete_card(card_id).await?;
        debug!("deleted card {card_id}");
        Ok(())
    }
}
