use std::sync::Arc;

use log::{debug, warn};
use rand::Rng;

use quiz_core::model::{DeckId, QuizCard, QuizSettings};
use quiz_core::scheduler::AppliedAnswer;
use quiz_core::{BoxScheduler, ChoiceGenerator};
use storage::repository::CardRepository;

use crate::error::QuizServiceError;

/// Presents cards, applies answers through the Leitner scheduler and
/// writes the resulting boxes back to storage.
#[derive(Clone)]
pub struct QuizService {
    choices: ChoiceGenerator,
    scheduler: BoxScheduler,
    cards: Arc<dyn CardRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(settings: &QuizSettings, cards: Arc<dyn CardRepository>) -> Self {
        Self {
            choices: settings.choice_generator(),
            scheduler: BoxScheduler::new(settings.leitner().clone()),
            cards,
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &BoxScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn choice_generator(&self) -> ChoiceGenerator {
        self.choices
    }

    /// Shuffled answer options for `card`.
    #[must_use]
    pub fn present_card(&self, card: &QuizCard) -> Vec<String> {
        self.choices.present_card(card)
    }

    pub fn present_card_with<R: Rng + ?Sized>(&self, card: &QuizCard, rng: &mut R) -> Vec<String> {
        self.choices.present(card, rng)
    }

    /// Apply `chosen` to `card` and persist the new box.
    ///
    /// On a storage failure the card keeps its previous box.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Scheduler` if the card's box is out of range.
    /// Returns `QuizServiceError::SaveBox` if the new box cannot be written.
    pub async fn answer(
        &self,
        card: &mut QuizCard,
        chosen: &str,
    ) -> Result<AppliedAnswer, QuizServiceError> {
        let before = card.clone();
        let applied = self.scheduler.apply_answer(card, chosen)?;

        if let Err(source) = self
            .cards
            .update_card_box(applied.card_id, applied.box_number)
            .await
        {
            warn!("rolling back card {}: {source}", applied.card_id);
            *card = before;
            return Err(QuizServiceError::SaveBox {
                card_id: applied.card_id,
                source,
            });
        }

        debug!(
            "card {} {}: box {} -> {}",
            applied.card_id,
            applied.outcome.as_str(),
            applied.previous_box,
            applied.box_number
        );
        Ok(applied)
    }

    /// [`answer`](Self::answer), returning only the new box.
    ///
    /// # Errors
    ///
    /// See [`answer`](Self::answer).
    pub async fn record_answer(&self, card: &mut QuizCard, chosen: &str) -> Result<u32, QuizServiceError> {
        self.answer(card, chosen).await.map(|applied| applied.box_number)
    }

    /// Cards in `all_cards` sitting in `round_box`.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Scheduler` for an unknown box.
    pub fn select_due_cards(
        &self,
        all_cards: &[QuizCard],
        round_box: u32,
    ) -> Result<Vec<QuizCard>, QuizServiceError> {
        Ok(self.scheduler.select_due_cards(all_cards, round_box)?)
    }

    /// Cards of `deck_id` due in `round`, lowest box first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the deck cannot be loaded.
    pub async fn due_cards(&self, deck_id: DeckId, round: u32) -> Result<Vec<QuizCard>, QuizServiceError> {
        let cards = self.cards.cards_by_deck(deck_id).await?;
        Ok(self.scheduler.cards_for_round(&cards, round))
    }
}
