//! Multiple-choice presentation of a quiz card.
//!
//! A presentation holds the correct answer once, at a uniformly random
//! position, plus distractors sampled without replacement from the card's
//! false-answer pool. Pool entries that repeat each other or the correct
//! answer are never offered, so a short pool yields fewer choices instead
//! of an error.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{QuizCard, SettingsError};

/// Number of choices shown per card unless configured otherwise.
pub const DEFAULT_CHOICE_COUNT: usize = 3;

/// Builds shuffled answer options for a card.
///
/// # Examples
///
/// ```
/// # use quiz_core::choices::ChoiceGenerator;
/// # use quiz_core::model::{CardId, DeckId, QuizCardDraft};
/// # use rand::SeedableRng;
/// let card = QuizCardDraft::new(DeckId::new(1), "Capital of Finland?", "Helsinki", ["Oslo", "Tallinn", "Tokyo"])
///     .validate(chrono::Utc::now())?
///     .assign_id(CardId::new(1));
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let choices = ChoiceGenerator::default().present(&card, &mut rng);
/// assert_eq!(choices.len(), 3);
/// assert!(choices.iter().any(|c| c == "Helsinki"));
/// # Ok::<(), quiz_core::model::CardError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceGenerator {
    choice_count: usize,
}

impl ChoiceGenerator {
    /// # Errors
    ///
    /// Returns `SettingsError::ZeroChoices` if `choice_count` is 0.
    pub fn new(choice_count: usize) -> Result<Self, SettingsError> {
        if choice_count == 0 {
            return Err(SettingsError::ZeroChoices);
        }
        Ok(Self::with_count(choice_count))
    }

    pub(crate) fn with_count(choice_count: usize) -> Self {
        Self { choice_count }
    }

    #[must_use]
    pub fn choice_count(&self) -> usize {
        self.choice_count
    }

    /// Produce `min(choice_count, 1 + usable pool size)` distinct strings,
    /// exactly one of which is the card's correct answer.
    pub fn present<R: Rng + ?Sized>(&self, card: &QuizCard, rng: &mut R) -> Vec<String> {
        let correct = card.correct_answer();

        // Same trimmed comparison as answer matching, so a distractor can
        // never be scored as correct.
        let mut pool: Vec<&str> = Vec::with_capacity(card.false_answers().len());
        for candidate in card.false_answers() {
            let candidate = candidate.trim();
            if !candidate.is_empty() && candidate != correct.trim() && !pool.contains(&candidate) {
                pool.push(candidate);
            }
        }

        // A full shuffle followed by a truncate is a uniform draw without
        // replacement, already in random order.
        pool.shuffle(rng);
        pool.truncate(self.choice_count.saturating_sub(1));

        let mut choices: Vec<String> = pool.into_iter().map(str::to_owned).collect();
        let slot = rng.random_range(0..=choices.len());
        choices.insert(slot, correct.to_owned());
        choices
    }

    /// [`present`](Self::present) with the thread-local RNG.
    #[must_use]
    pub fn present_card(&self, card: &QuizCard) -> Vec<String> {
        self.present(card, &mut rand::rng())
    }
}

impl Default for ChoiceGenerator {
    fn default() -> Self {
        Self::with_count(DEFAULT_CHOICE_COUNT)
    }
}
