use serde::{Deserialize, Serialize};

use crate::model::card::QuizCard;

/// Result of checking a picked choice against a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOutcome {
    /// The pick matched the correct answer. The card moves up one box.
    Correct,
    /// Anything else. The card drops back to box 0.
    Incorrect,
}

impl AnswerOutcome {
    /// Compare the chosen text (ignoring surrounding whitespace) with the
    /// card's correct answer.
    #[must_use]
    pub fn evaluate(card: &QuizCard, chosen: &str) -> Self {
        if chosen.trim() == card.correct_answer().trim() {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}
