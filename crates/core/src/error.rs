use thiserror::Error;

use crate::model::{CardError, DeckError, SettingsError, UserError};
use crate::scheduler::SchedulerError;

/// Umbrella error for everything the core can reject.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl Error {
    /// True for malformed entity construction or configuration.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Card(_) | Error::Deck(_) | Error::User(_) | Error::Settings(_)
        )
    }

    /// True when a box transition was requested on an unknown card or box.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::Scheduler(_))
    }
}
