use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{DeckId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,
}

/// A named collection of quiz cards owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    id: DeckId,
    user_id: UserId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Deck {
    /// Creates a new Deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if name is empty or whitespace-only.
    pub fn new(
        id: DeckId,
        user_id: UserId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DeckError> {
        let name = normalize_deck_name(&name.into())?;
        Ok(Self {
            id,
            user_id,
            name,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> DeckId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Trimmed deck name, as stored and compared for per-user uniqueness.
///
/// # Errors
///
/// Returns `DeckError::EmptyName` for blank input.
pub fn normalize_deck_name(raw: &str) -> Result<String, DeckError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DeckError::EmptyName);
    }
    Ok(name.to_owned())
}
