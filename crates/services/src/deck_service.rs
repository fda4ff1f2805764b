use std::sync::Arc;

use log::info;
use quiz_core::model::{Deck, DeckId, UserId, normalize_deck_name};
use storage::repository::{DeckRepository, NewDeckRecord};

use crate::Clock;
use crate::error::DeckServiceError;

/// Orchestrates deck creation and lookup.
#[derive(Clone)]
pub struct DeckService {
    clock: Clock,
    decks: Arc<dyn DeckRepository>,
}

impl DeckService {
    #[must_use]
    pub fn new(clock: Clock, decks: Arc<dyn DeckRepository>) -> Self {
        Self { clock, decks }
    }

    /// Create a new deck for `user_id` and persist it.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Deck` for a blank name.
    /// Returns `DeckServiceError::Storage` if the user is missing (`NotFound`),
    /// already owns a deck with that name (`Conflict`), or persistence fails.
    pub async fn create_deck(&self, name: &str, user_id: UserId) -> Result<DeckId, DeckServiceError> {
        let deck = Deck::new(DeckId::new(0), user_id, name, self.clock.now())?;
        let deck_id = self
            .decks
            .insert_new_deck(NewDeckRecord::from_deck(&deck))
            .await?;
        info!("created deck {:?} ({deck_id}) for user {user_id}", deck.name());
        Ok(deck_id)
    }

    /// # Errors
    ///
    /// Returns `DeckServiceError::Deck` for a blank name and
    /// `DeckServiceError::Storage` (`NotFound`) if the user has no such deck.
    pub async fn find_deck_by_name(&self, name: &str, user_id: UserId) -> Result<Deck, DeckServiceError> {
        let name = normalize_deck_name(name)?;
        Ok(self.decks.find_deck_by_name(&name, user_id).await?)
    }

    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn list_decks(&self, user_id: UserId) -> Result<Vec<Deck>, DeckServiceError> {
        Ok(self.decks.list_decks_by_user(user_id).await?)
    }

    /// Returns `Ok(None)` when the deck does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckServiceError> {
        Ok(self.decks.get_deck(deck_id).await?)
    }

    /// Delete a deck and its cards.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` (`NotFound`) if the deck is missing.
    pub async fn delete_deck(&self, deck_id: DeckId) -> Result<(), DeckServiceError> {
        self.decks.delete_deck(deck_id).await?;
        info!("deleted deck {deck_id}");
        Ok(())
    }
}
