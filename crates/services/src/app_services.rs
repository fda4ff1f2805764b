use std::sync::Arc;

use quiz_core::model::QuizSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::card_service::CardService;
use crate::deck_service::DeckService;
use crate::error::AppServicesError;
use crate::quiz_service::QuizService;
use crate::sessions::TrainingService;
use crate::user_service::UserService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    settings: QuizSettings,
    users: Arc<UserService>,
    decks: Arc<DeckService>,
    cards: Arc<CardService>,
    training: Arc<TrainingService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        settings: QuizSettings,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, settings, clock))
    }

    /// Build services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(settings: QuizSettings, clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), settings, clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, settings: QuizSettings, clock: Clock) -> Self {
        let quiz = QuizService::new(&settings, Arc::clone(&storage.cards));
        Self {
            users: Arc::new(UserService::new(clock, Arc::clone(&storage.users))),
            decks: Arc::new(DeckService::new(clock, Arc::clone(&storage.decks))),
            cards: Arc::new(CardService::new(clock, Arc::clone(&storage.cards))),
            training: Arc::new(TrainingService::new(clock, quiz, Arc::clone(&storage.decks))),
            settings,
        }
    }

    /// Replace the training service with one that shuffles choices from `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.training = Arc::new(self.training.as_ref().clone().with_seed(seed));
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn decks(&self) -> Arc<DeckService> {
        Arc::clone(&self.decks)
    }

    #[must_use]
    pub fn cards(&self) -> Arc<CardService> {
        Arc::clone(&self.cards)
    }

    #[must_use]
    pub fn training(&self) -> Arc<TrainingService> {
        Arc::clone(&self.training)
    }
}
