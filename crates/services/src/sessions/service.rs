use std::sync::Arc;

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use quiz_core::model::{CardId, DeckId};
use quiz_core::scheduler::AppliedAnswer;
use storage::repository::DeckRepository;

use super::session::TrainingSession;
use crate::Clock;
use crate::error::TrainingError;
use crate::quiz_service::QuizService;

/// Runs training rounds: loads due cards, hands out choices and persists
/// every answered card's new box.
///
/// Each deck remembers the round after the last one it finished, so
/// repeated sessions walk through the cadence instead of replaying one round.
#[derive(Clone)]
pub struct TrainingService {
    clock: Clock,
    quiz: QuizService,
    decks: Arc<dyn DeckRepository>,
    seed: Option<u64>,
}

impl TrainingService {
    #[must_use]
    pub fn new(clock: Clock, quiz: QuizService, decks: Arc<dyn DeckRepository>) -> Self {
        Self {
            clock,
            quiz,
            decks,
            seed: None,
        }
    }

    /// Fix the choice shuffling of every session started from here on.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizService {
        &self.quiz
    }

    fn session_rng(&self, round: u32) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(round))),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Round the next session of `deck_id` should run.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Storage` (`NotFound`) if the deck is missing.
    pub async fn next_round(&self, deck_id: DeckId) -> Result<u32, TrainingError> {
        Ok(self.decks.next_round(deck_id).await?)
    }

    /// Start the deck's next round.
    ///
    /// A round with nothing due counts as finished, so the deck moves on to
    /// the following round before `TrainingError::Empty` is returned.
    ///
    /// # Errors
    ///
    /// See [`start_round`](Self::start_round) and [`next_round`](Self::next_round).
    pub async fn start_next_round(&self, deck_id: DeckId) -> Result<TrainingSession, TrainingError> {
        let round = self.next_round(deck_id).await?;
        match self.start_round(deck_id, round).await {
            Err(TrainingError::Empty { round }) => {
                self.finish_round(deck_id, round).await?;
                Err(TrainingError::Empty { round })
            }
            other => other,
        }
    }

    async fn finish_round(&self, deck_id: DeckId, round: u32) -> Result<(), TrainingError> {
        self.decks
            .set_next_round(deck_id, round.saturating_add(1))
            .await?;
        Ok(())
    }

    /// Start `round` over the cards of `deck_id` that are due in it.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Empty` if nothing is due.
    /// Returns `TrainingError::Quiz` if the deck cannot be loaded.
    pub async fn start_round(&self, deck_id: DeckId, round: u32) -> Result<TrainingSession, TrainingError> {
        let cards = self.quiz.due_cards(deck_id, round).await?;
        let session = TrainingSession::new(
            deck_id,
            round,
            cards,
            self.quiz.choice_generator(),
            self.session_rng(round),
            self.clock.now(),
        )?;
        info!(
            "round {round} of deck {deck_id} started with {} card(s)",
            session.progress().total
        );
        Ok(session)
    }

    /// Answer `card_id` with `chosen` and persist its new box. Answering the
    /// last card also records the round as finished for the deck.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`TrainingSession::check_answer`], or
    /// `TrainingError::Quiz` if scheduling or persistence fails. The session
    /// does not advance on error.
    pub async fn answer(
        &self,
        session: &mut TrainingSession,
        card_id: CardId,
        chosen: &str,
    ) -> Result<AppliedAnswer, TrainingError> {
        session.check_answer(card_id, chosen)?;
        let card = session.current_card_mut().ok_or(TrainingError::Completed)?;
        let applied = self.quiz.answer(card, chosen).await?;
        session.advance(applied, self.clock.now());

        if session.is_complete() {
            self.finish_round(session.deck_id(), session.round()).await?;
            let summary = session.summary();
            info!(
                "round {} of deck {} finished: {} correct, {} incorrect",
                summary.round, summary.deck_id, summary.correct, summary.incorrect
            );
        }
        Ok(applied)
    }

    /// Answer whichever card is current.
    ///
    /// # Errors
    ///
    /// See [`answer`](Self::answer).
    pub async fn answer_current(
        &self,
        session: &mut TrainingSession,
        chosen: &str,
    ) -> Result<AppliedAnswer, TrainingError> {
        let card_id = session.current().ok_or(TrainingError::Completed)?.id();
        self.answer(session, card_id, chosen).await
    }
}
