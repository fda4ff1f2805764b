mod answer;
mod card;
mod deck;
mod ids;
mod settings;
mod user;

pub use ids::{CardId, DeckId, ParseIdError, UserId};

pub use answer::AnswerOutcome;
pub use card::{CardError, MIN_FALSE_ANSWERS, QuizCard, QuizCardDraft, ValidatedQuizCard};
pub use deck::{Deck, DeckError, normalize_deck_name};
pub use settings::{QuizSettings, SettingsError};
pub use user::{User, UserError};
