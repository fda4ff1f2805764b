use chrono::{DateTime, Utc};
use log::warn;
use rand::rngs::StdRng;

use quiz_core::ChoiceGenerator;
use quiz_core::model::{CardId, DeckId, QuizCard};
use quiz_core::scheduler::{AppliedAnswer, SchedulerError};

use super::summary::SessionSummary;
use crate::error::TrainingError;

/// Snapshot of how far a session has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
}

/// One training round over a deck.
///
/// Steps through the round's due cards in order, keeping the choices shown
/// for the current card. Answers are applied by `TrainingService`, which
/// persists the new box before the session advances.
pub struct TrainingSession {
    deck_id: DeckId,
    round: u32,
    cards: Vec<QuizCard>,
    current: usize,
    choices: Vec<String>,
    results: Vec<AppliedAnswer>,
    generator: ChoiceGenerator,
    rng: StdRng,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TrainingSession {
    /// Start a round over `cards`, presenting the first one.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Empty` if no cards are due.
    pub fn new(
        deck_id: DeckId,
        round: u32,
        cards: Vec<QuizCard>,
        generator: ChoiceGenerator,
        rng: StdRng,
        started_at: DateTime<Utc>,
    ) -> Result<Self, TrainingError> {
        if cards.is_empty() {
            return Err(TrainingError::Empty { round });
        }

        let mut session = Self {
            deck_id,
            round,
            cards,
            current: 0,
            choices: Vec::new(),
            results: Vec::new(),
            generator,
            rng,
            started_at,
            completed_at: None,
        };
        session.present_current();
        Ok(session)
    }

    fn present_current(&mut self) {
        self.choices = match self.cards.get(self.current) {
            Some(card) => self.generator.present(card, &mut self.rng),
            None => Vec::new(),
        };
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuizCard> {
        self.cards.get(self.current)
    }

    /// Choices shown for the current card; empty once the round is over.
    #[must_use]
    pub fn current_choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.cards.len()
    }

    #[must_use]
    pub fn results(&self) -> &[AppliedAnswer] {
        &self.results
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.cards.len(),
            answered: self.results.len(),
            remaining: self.cards.len().saturating_sub(self.current),
        }
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_results(
            self.deck_id,
            self.round,
            self.cards.len(),
            &self.results,
            self.started_at,
            self.completed_at,
        )
    }

    /// Check that `chosen` answers the card currently on screen.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Completed` after the last card.
    /// Returns `SchedulerError::UntrackedCard` (wrapped) if `card_id` is not
    /// the current card.
    /// Returns `TrainingError::NotAChoice` if `chosen` was not offered.
    pub fn check_answer(&self, card_id: CardId, chosen: &str) -> Result<(), TrainingError> {
        let current = self.current().ok_or(TrainingError::Completed)?;
        if current.id() != card_id {
            warn!("answer for card {card_id} while card {} is current", current.id());
            return Err(SchedulerError::UntrackedCard { card_id }.into());
        }

        let chosen = chosen.trim();
        if !self.choices.iter().any(|c| c == chosen) {
            warn!("rejected answer {chosen:?} for card {card_id}");
            return Err(TrainingError::NotAChoice {
                chosen: chosen.to_owned(),
            });
        }
        Ok(())
    }

    pub(crate) fn current_card_mut(&mut self) -> Option<&mut QuizCard> {
        self.cards.get_mut(self.current)
    }

    /// Store the applied answer and move to the next card.
    pub(crate) fn advance(&mut self, applied: AppliedAnswer, now: DateTime<Utc>) {
        self.results.push(applied);
        self.current += 1;
        self.present_current();
        if self.is_complete() {
            self.completed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::BoxScheduler;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;

    fn card(id: u64, box_number: u32) -> QuizCard {
        QuizCard::from_persisted(
            CardId::new(id),
            DeckId::new(1),
            format!("Question {id}"),
            "Helsinki".into(),
            vec!["Tokyo".into(), "Oslo".into(), "Tallinn".into()],
            box_number,
            fixed_now(),
        )
        .unwrap()
    }

    fn session(cards: Vec<QuizCard>) -> TrainingSession {
        TrainingSession::new(
            DeckId::new(1),
            1,
            cards,
            ChoiceGenerator::default(),
            StdRng::seed_from_u64(11),
            fixed_now(),
        )
        .unwrap()
    }

    fn answer(session: &mut TrainingSession, chosen: &str) {
        let id = session.current().unwrap().id();
        session.check_answer(id, chosen).unwrap();
        let card = session.current_card_mut().unwrap();
        let applied = BoxScheduler::default().apply_answer(card, chosen).unwrap();
        session.advance(applied, fixed_now());
    }

    #[test]
    fn empty_round_is_rejected() {
        let err = TrainingSession::new(
            DeckId::new(1),
            3,
            Vec::new(),
            ChoiceGenerator::default(),
            StdRng::seed_from_u64(1),
            fixed_now(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TrainingError::Empty { round: 3 }));
    }

    #[test]
    fn first_card_is_presented_on_start() {
        let session = session(vec![card(1, 0), card(2, 0)]);
        assert_eq!(session.current().unwrap().id(), CardId::new(1));
        assert_eq!(session.current_choices().len(), 3);
        assert!(session.current_choices().iter().any(|c| c == "Helsinki"));
        assert_eq!(
            session.progress(),
            SessionProgress {
                total: 2,
                answered: 0,
                remaining: 2
            }
        );
    }

    #[test]
    fn answering_a_different_card_is_untracked() {
        let session = session(vec![card(1, 0), card(2, 0)]);
        let err = session.check_answer(CardId::new(2), "Helsinki").unwrap_err();
        assert!(matches!(
            err,
            TrainingError::Scheduler(SchedulerError::UntrackedCard { card_id }) if card_id == CardId::new(2)
        ));
    }

    #[test]
    fn unoffered_answer_is_rejected() {
        let session = session(vec![card(1, 0)]);
        let err = session.check_answer(CardId::new(1), "Paris").unwrap_err();
        assert!(matches!(err, TrainingError::NotAChoice { .. }));
    }

    #[test]
    fn stepping_through_completes_the_round() {
        let mut session = session(vec![card(1, 0), card(2, 3)]);
        answer(&mut session, "Helsinki");
        let wrong = session
            .current_choices()
            .iter()
            .find(|c| *c != "Helsinki")
            .cloned()
            .unwrap();
        answer(&mut session, &wrong);

        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert!(session.current_choices().is_empty());
        assert_eq!(session.completed_at(), Some(fixed_now()));
        assert!(matches!(
            session.check_answer(CardId::new(1), "Helsinki"),
            Err(TrainingError::Completed)
        ));

        let summary = session.summary();
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.promoted, 1);
        assert_eq!(summary.reset, 1);
        assert!(summary.is_complete());
    }
}
