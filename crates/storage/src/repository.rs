use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use quiz_core::model::{
    CardId, Deck, DeckId, QuizCard, User, UserId, ValidatedQuizCard,
};
use quiz_core::scheduler::FIRST_ROUND;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{entity} already exists")]
    Conflict { entity: &'static str },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Insert shape for a user; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl NewUserRecord {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username().to_owned(),
            name: user.name().to_owned(),
            created_at: user.created_at(),
        }
    }
}

/// Insert shape for a deck; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewDeckRecord {
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl NewDeckRecord {
    #[must_use]
    pub fn from_deck(deck: &Deck) -> Self {
        Self {
            user_id: deck.user_id(),
            name: deck.name().to_owned(),
            created_at: deck.created_at(),
        }
    }
}

/// Insert shape for a quiz card; new cards are stored in box 0.
#[derive(Debug, Clone)]
pub struct NewCardRecord {
    pub deck_id: DeckId,
    pub question: String,
    pub correct_answer: String,
    pub false_answers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ValidatedQuizCard> for NewCardRecord {
    fn from(card: ValidatedQuizCard) -> Self {
        Self {
            deck_id: card.deck_id,
            question: card.question,
            correct_answer: card.correct_answer,
            false_answers: card.false_answers,
            created_at: card.created_at,
        }
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username is taken.
    async fn insert_new_user(&self, user: NewUserRecord) -> Result<UserId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Delete a user together with its decks and their cards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn delete_user(&self, id: UserId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait DeckRepository: Send + Sync {
    /// Persist a new deck for its owner and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owner does not exist and
    /// `StorageError::Conflict` if the owner already has a deck with that name.
    async fn insert_new_deck(&self, deck: NewDeckRecord) -> Result<DeckId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError>;

    /// Look up a deck by name within one user's decks.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no such deck.
    async fn find_deck_by_name(&self, name: &str, user_id: UserId) -> Result<Deck, StorageError>;

    /// Decks owned by `user_id`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_decks_by_user(&self, user_id: UserId) -> Result<Vec<Deck>, StorageError>;

    /// Delete a deck together with its cards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck does not exist.
    async fn delete_deck(&self, id: DeckId) -> Result<(), StorageError>;

    /// Round the next training session of this deck starts at.
    /// New decks start at `FIRST_ROUND`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck does not exist.
    async fn next_round(&self, id: DeckId) -> Result<u32, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck does not exist.
    async fn set_next_round(&self, id: DeckId, round: u32) -> Result<(), StorageError>;
}

#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Persist a new card in box 0 and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck does not exist.
    async fn insert_new_card(&self, card: NewCardRecord) -> Result<CardId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_card(&self, id: CardId) -> Result<Option<QuizCard>, StorageError>;

    /// Cards of a deck, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn cards_by_deck(&self, deck_id: DeckId) -> Result<Vec<QuizCard>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card does not exist.
    async fn update_card_box(&self, id: CardId, box_number: u32) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card does not exist.
    async fn delete_card(&self, id: CardId) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    decks: BTreeMap<DeckId, Deck>,
    next_rounds: BTreeMap<DeckId, u32>,
    cards: BTreeMap<CardId, QuizCard>,
    last_user_id: u64,
    last_deck_id: u64,
    last_card_id: u64,
}

impl Tables {
    fn drop_deck(&mut self, id: DeckId) {
        self.decks.remove(&id);
        self.next_rounds.remove(&id);
        self.cards.retain(|_, card| card.deck_id() != id);
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_new_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        let mut guard = self.lock()?;
        if guard.users.values().any(|u| u.username() == user.username) {
            return Err(StorageError::Conflict { entity: "user" });
        }

        guard.last_user_id += 1;
        let id = UserId::new(guard.last_user_id);
        let stored = User::new(id, user.username, user.name, user.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.users.insert(id, stored);
        debug!("stored user {id}");
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .users
            .values()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.users.remove(&id).is_none() {
            return Err(StorageError::NotFound { entity: "user" });
        }
        let owned: Vec<DeckId> = guard
            .decks
            .values()
            .filter(|d| d.user_id() == id)
            .map(Deck::id)
            .collect();
        for deck_id in owned {
            guard.drop_deck(deck_id);
        }
        debug!("deleted user {id}");
        Ok(())
    }
}

#[async_trait]
impl DeckRepository for InMemoryRepository {
    async fn insert_new_deck(&self, deck: NewDeckRecord) -> Result<DeckId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.users.contains_key(&deck.user_id) {
            return Err(StorageError::NotFound { entity: "user" });
        }
        if guard
            .decks
            .values()
            .any(|d| d.user_id() == deck.user_id && d.name() == deck.name)
        {
            return Err(StorageError::Conflict { entity: "deck" });
        }

        guard.last_deck_id += 1;
        let id = DeckId::new(guard.last_deck_id);
        let stored = Deck::new(id, deck.user_id, deck.name, deck.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.decks.insert(id, stored);
        debug!("stored deck {id} for user {}", deck.user_id);
        Ok(id)
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError> {
        Ok(self.lock()?.decks.get(&id).cloned())
    }

    async fn find_deck_by_name(&self, name: &str, user_id: UserId) -> Result<Deck, StorageError> {
        let guard = self.lock()?;
        guard
            .decks
            .values()
            .find(|d| d.user_id() == user_id && d.name() == name)
            .cloned()
            .ok_or(StorageError::NotFound { entity: "deck" })
    }

    async fn list_decks_by_user(&self, user_id: UserId) -> Result<Vec<Deck>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .decks
            .values()
            .filter(|d| d.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.decks.contains_key(&id) {
            return Err(StorageError::NotFound { entity: "deck" });
        }
        guard.drop_deck(id);
        debug!("deleted deck {id}");
        Ok(())
    }

    async fn next_round(&self, id: DeckId) -> Result<u32, StorageError> {
        let guard = self.lock()?;
        if !guard.decks.contains_key(&id) {
            return Err(StorageError::NotFound { entity: "deck" });
        }
        Ok(guard.next_rounds.get(&id).copied().unwrap_or(FIRST_ROUND))
    }

    async fn set_next_round(&self, id: DeckId, round: u32) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.decks.contains_key(&id) {
            return Err(StorageError::NotFound { entity: "deck" });
        }
        guard.next_rounds.insert(id, round);
        debug!("deck {id} continues at round {round}");
        Ok(())
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn insert_new_card(&self, card: NewCardRecord) -> Result<CardId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.decks.contains_key(&card.deck_id) {
            return Err(StorageError::NotFound { entity: "deck" });
        }

        guard.last_card_id += 1;
        let id = CardId::new(guard.last_card_id);
        let stored = QuizCard::from_persisted(
            id,
            card.deck_id,
            card.question,
            card.correct_answer,
            card.false_answers,
            0,
            card.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.cards.insert(id, stored);
        debug!("stored card {id} in deck {}", card.deck_id);
        Ok(id)
    }

    async fn get_card(&self, id: CardId) -> Result<Option<QuizCard>, StorageError> {
        Ok(self.lock()?.cards.get(&id).cloned())
    }

    async fn cards_by_deck(&self, deck_id: DeckId) -> Result<Vec<QuizCard>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .cards
            .values()
            .filter(|c| c.deck_id() == deck_id)
            .cloned()
            .collect())
    }

    async fn update_card_box(&self, id: CardId, box_number: u32) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let current = guard
            .cards
            .get(&id)
            .ok_or(StorageError::NotFound { entity: "card" })?;
        let updated = QuizCard::from_persisted(
            current.id(),
            current.deck_id(),
            current.question().to_owned(),
            current.correct_answer().to_owned(),
            current.false_answers().to_vec(),
            box_number,
            current.created_at(),
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.cards.insert(id, updated);
        debug!("card {id} moved to box {box_number}");
        Ok(())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .cards
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound { entity: "card" })
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub decks: Arc<dyn DeckRepository>,
    pub cards: Arc<dyn CardRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let decks: Arc<dyn DeckRepository> = Arc::new(repo.clone());
        let cards: Arc<dyn CardRepository> = Arc::new(repo);
        Self {
            users,
            decks,
            cards,
        }
    }
}
