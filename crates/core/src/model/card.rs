use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CardId, DeckId};

/// Smallest false-answer pool a new card may be created with.
pub const MIN_FALSE_ANSWERS: usize = 1;

//
// ─── CARD VALIDATION ERRORS ────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("question cannot be empty")]
    EmptyQuestion,

    #[error("correct answer cannot be empty")]
    EmptyAnswer,

    #[error("false answer #{index} cannot be empty")]
    EmptyFalseAnswer { index: usize },

    #[error("at least {required} distinct false answer(s) required, got {provided}")]
    NotEnoughFalseAnswers { required: usize, provided: usize },
}

//
// ─── CARD TYPES ────────────────────────────────────────────────────────────────
//

/// Unvalidated input for a new quiz card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCardDraft {
    pub deck_id: DeckId,
    pub question: String,
    pub correct_answer: String,
    pub false_answers: Vec<String>,
}

impl QuizCardDraft {
    pub fn new<S: Into<String>>(
        deck_id: DeckId,
        question: impl Into<String>,
        correct_answer: impl Into<String>,
        false_answers: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            deck_id,
            question: question.into(),
            correct_answer: correct_answer.into(),
            false_answers: false_answers.into_iter().map(Into::into).collect(),
        }
    }

    /// Trim all text, drop repeated false answers and those equal to the
    /// correct answer, then check the remaining pool size.
    ///
    /// # Errors
    ///
    /// Returns `CardError` when any text is empty or fewer than
    /// `MIN_FALSE_ANSWERS` distinct false answers remain.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedQuizCard, CardError> {
        let question = non_empty(&self.question).ok_or(CardError::EmptyQuestion)?;
        let correct_answer = non_empty(&self.correct_answer).ok_or(CardError::EmptyAnswer)?;

        let mut false_answers: Vec<String> = Vec::with_capacity(self.false_answers.len());
        for (index, raw) in self.false_answers.iter().enumerate() {
            let answer = non_empty(raw).ok_or(CardError::EmptyFalseAnswer { index })?;
            if answer == correct_answer || false_answers.contains(&answer) {
                continue;
            }
            false_answers.push(answer);
        }

        if false_answers.len() < MIN_FALSE_ANSWERS {
            return Err(CardError::NotEnoughFalseAnswers {
                required: MIN_FALSE_ANSWERS,
                provided: false_answers.len(),
            });
        }

        Ok(ValidatedQuizCard {
            deck_id: self.deck_id,
            question,
            correct_answer,
            false_answers,
            created_at: now,
        })
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// A card that passed validation but has no store-assigned id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuizCard {
    pub deck_id: DeckId,
    pub question: String,
    pub correct_answer: String,
    pub false_answers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedQuizCard {
    /// New cards always start in box 0.
    #[must_use]
    pub fn assign_id(self, id: CardId) -> QuizCard {
        QuizCard {
            id,
            deck_id: self.deck_id,
            question: self.question,
            correct_answer: self.correct_answer,
            false_answers: self.false_answers,
            box_number: 0,
            created_at: self.created_at,
        }
    }
}

/// A multiple-choice question tracked in a Leitner box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCard {
    id: CardId,
    deck_id: DeckId,
    question: String,
    correct_answer: String,
    false_answers: Vec<String>,
    box_number: u32,
    created_at: DateTime<Utc>,
}

impl QuizCard {
    /// Rehydrate a card from storage.
    ///
    /// The false-answer pool is kept as stored; presentation filters it.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyQuestion` / `CardError::EmptyAnswer` when the
    /// stored text is blank.
    pub fn from_persisted(
        id: CardId,
        deck_id: DeckId,
        question: String,
        correct_answer: String,
        false_answers: Vec<String>,
        box_number: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CardError> {
        if question.trim().is_empty() {
            return Err(CardError::EmptyQuestion);
        }
        if correct_answer.trim().is_empty() {
            return Err(CardError::EmptyAnswer);
        }

        Ok(Self {
            id,
            deck_id,
            question,
            correct_answer,
            false_answers,
            box_number,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn false_answers(&self) -> &[String] {
        &self.false_answers
    }

    #[must_use]
    pub fn box_number(&self) -> u32 {
        self.box_number
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_box_number(&mut self, box_number: u32) {
        self.box_number = box_number;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
