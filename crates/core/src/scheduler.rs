use thiserror::Error;

use crate::model::{AnswerOutcome, CardId, QuizCard, SettingsError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Invalid-state failures of the box system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("invalid state: box {box_number} is outside 0..={max_box}")]
    BoxOutOfRange { box_number: u32, max_box: u32 },

    #[error("invalid state: card {card_id} is not tracked")]
    UntrackedCard { card_id: CardId },
}

//
// ─── CONFIGURATION ─────────────────────────────────────────────────────────────
//

/// Default number of Leitner boxes (0..=4).
pub const DEFAULT_BOX_COUNT: usize = 5;

/// Round a fresh deck starts training at. Round 0 would review every box.
pub const FIRST_ROUND: u32 = 1;

/// Box configuration: how many boxes exist and how often each is reviewed.
///
/// `intervals[b]` is the number of rounds between two reviews of box `b`.
/// Each interval is a multiple of the one below it, so whenever a box is due
/// every lower box is due too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeitnerConfig {
    intervals: Vec<u32>,
}

impl LeitnerConfig {
    /// Upper bound on the box count, keeping doubling intervals within `u32`.
    pub const MAX_BOXES: usize = 32;

    /// # Errors
    ///
    /// Returns `SettingsError` if there are no boxes, too many boxes, a zero
    /// interval, or an interval that is smaller than or not a multiple of the
    /// one of the box below.
    pub fn new(intervals: Vec<u32>) -> Result<Self, SettingsError> {
        if intervals.is_empty() {
            return Err(SettingsError::NoBoxes);
        }
        if intervals.len() > Self::MAX_BOXES {
            return Err(SettingsError::TooManyBoxes {
                provided: intervals.len(),
                max: Self::MAX_BOXES,
            });
        }
        for (box_number, &interval) in intervals.iter().enumerate() {
            if interval == 0 {
                return Err(SettingsError::ZeroInterval { box_number });
            }
            let Some(&below) = box_number.checked_sub(1).and_then(|b| intervals.get(b)) else {
                continue;
            };
            if interval < below {
                return Err(SettingsError::DecreasingInterval { box_number });
            }
            if interval % below != 0 {
                return Err(SettingsError::NonNestedInterval { box_number });
            }
        }
        Ok(Self { intervals })
    }

    /// Box 0 every round, each higher box half as often as the one below.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if `box_count` is 0 or above `MAX_BOXES`.
    pub fn doubling(box_count: usize) -> Result<Self, SettingsError> {
        if box_count > Self::MAX_BOXES {
            return Err(SettingsError::TooManyBoxes {
                provided: box_count,
                max: Self::MAX_BOXES,
            });
        }
        Self::new((0..box_count).map(|b| 1_u32 << b).collect())
    }

    #[must_use]
    pub fn box_count(&self) -> usize {
        self.intervals.len()
    }

    /// Highest box index, `N` in `0..=N`.
    #[must_use]
    pub fn max_box(&self) -> u32 {
        u32::try_from(self.intervals.len() - 1).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn intervals(&self) -> &[u32] {
        &self.intervals
    }

    #[must_use]
    pub fn interval(&self, box_number: u32) -> Option<u32> {
        usize::try_from(box_number)
            .ok()
            .and_then(|b| self.intervals.get(b).copied())
    }
}

impl Default for LeitnerConfig {
    fn default() -> Self {
        Self {
            intervals: (0..DEFAULT_BOX_COUNT).map(|b| 1_u32 << b).collect(),
        }
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Outcome of applying an answer to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedAnswer {
    pub card_id: CardId,
    pub outcome: AnswerOutcome,
    pub previous_box: u32,
    pub box_number: u32,
}

impl AppliedAnswer {
    #[must_use]
    pub fn promoted(&self) -> bool {
        self.box_number > self.previous_box
    }

    /// A wrong answer on a card that was above box 0.
    #[must_use]
    pub fn reset(&self) -> bool {
        self.outcome == AnswerOutcome::Incorrect && self.previous_box > 0
    }
}

/// Leitner box scheduler.
///
/// A correct answer moves a card up one box (capped at the top box), an
/// incorrect one sends it back to box 0. Which boxes are reviewed in a given
/// round follows the configured intervals.
///
/// # Examples
///
/// ```
/// # use quiz_core::scheduler::BoxScheduler;
/// # use quiz_core::model::AnswerOutcome;
/// let scheduler = BoxScheduler::default();
/// assert_eq!(scheduler.next_box(1, AnswerOutcome::Correct)?, 2);
/// assert_eq!(scheduler.next_box(4, AnswerOutcome::Correct)?, 4);
/// assert_eq!(scheduler.next_box(3, AnswerOutcome::Incorrect)?, 0);
/// # Ok::<(), quiz_core::scheduler::SchedulerError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxScheduler {
    config: LeitnerConfig,
}

impl BoxScheduler {
    #[must_use]
    pub fn new(config: LeitnerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &LeitnerConfig {
        &self.config
    }

    #[must_use]
    pub fn max_box(&self) -> u32 {
        self.config.max_box()
    }

    fn interval_of(&self, box_number: u32) -> Result<u32, SchedulerError> {
        self.config
            .interval(box_number)
            .ok_or(SchedulerError::BoxOutOfRange {
                box_number,
                max_box: self.max_box(),
            })
    }

    /// # Errors
    ///
    /// Returns `SchedulerError::BoxOutOfRange` if `current` is above the top box.
    pub fn next_box(&self, current: u32, outcome: AnswerOutcome) -> Result<u32, SchedulerError> {
        self.interval_of(current)?;
        Ok(match outcome {
            AnswerOutcome::Correct => current.saturating_add(1).min(self.max_box()),
            AnswerOutcome::Incorrect => 0,
        })
    }

    /// Evaluate `chosen` against the card and move it to its next box.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::BoxOutOfRange` if the card's box is outside the
    /// configured range; the card is left untouched.
    pub fn apply_answer(
        &self,
        card: &mut QuizCard,
        chosen: &str,
    ) -> Result<AppliedAnswer, SchedulerError> {
        let outcome = AnswerOutcome::evaluate(card, chosen);
        let previous_box = card.box_number();
        let box_number = self.next_box(previous_box, outcome)?;
        card.set_box_number(box_number);

        Ok(AppliedAnswer {
            card_id: card.id(),
            outcome,
            previous_box,
            box_number,
        })
    }

    /// Same as [`apply_answer`](Self::apply_answer), returning only the new box.
    ///
    /// # Errors
    ///
    /// See [`apply_answer`](Self::apply_answer).
    pub fn record_answer(&self, card: &mut QuizCard, chosen: &str) -> Result<u32, SchedulerError> {
        self.apply_answer(card, chosen).map(|applied| applied.box_number)
    }

    /// Whether `box_number` is reviewed in `round`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::BoxOutOfRange` for an unknown box.
    pub fn is_due(&self, box_number: u32, round: u32) -> Result<bool, SchedulerError> {
        Ok(round % self.interval_of(box_number)? == 0)
    }

    /// Boxes reviewed in `round`, lowest first. Box 0 is always included.
    #[must_use]
    pub fn due_boxes(&self, round: u32) -> Vec<u32> {
        (0..=self.max_box())
            .filter(|&b| self.is_due(b, round).unwrap_or(false))
            .collect()
    }

    /// Cards currently sitting in `round_box`, in input order.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::BoxOutOfRange` for an unknown box.
    pub fn select_due_cards(
        &self,
        cards: &[QuizCard],
        round_box: u32,
    ) -> Result<Vec<QuizCard>, SchedulerError> {
        self.interval_of(round_box)?;
        Ok(cards
            .iter()
            .filter(|c| c.box_number() == round_box)
            .cloned()
            .collect())
    }

    /// All cards due in `round`: every due box in ascending order, input
    /// order kept within a box. Cards whose box lies outside the configured
    /// range are never due.
    #[must_use]
    pub fn cards_for_round(&self, cards: &[QuizCard], round: u32) -> Vec<QuizCard> {
        let mut due = Vec::new();
        for box_number in self.due_boxes(round) {
            due.extend(
                cards
                    .iter()
                    .filter(|c| c.box_number() == box_number)
                    .cloned(),
            );
        }
        due
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeckId;
    use crate::time::fixed_now;

    fn card(id: u64, box_number: u32) -> QuizCard {
        QuizCard::from_persisted(
            CardId::new(id),
            DeckId::new(1),
            "What is the capital city of Finland?".into(),
            "Helsinki".into(),
            vec![
                "Tokyo".into(),
                "Oslo".into(),
                "Shanghai".into(),
                "Stockholm".into(),
                "Tallinn".into(),
            ],
            box_number,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn default_config_is_five_doubling_boxes() {
        let config = LeitnerConfig::default();
        assert_eq!(config.intervals(), &[1, 2, 4, 8, 16]);
        assert_eq!(config, LeitnerConfig::doubling(5).unwrap());
        assert_eq!(config.max_box(), 4);
    }

    #[test]
    fn config_rejects_bad_intervals() {
        assert_eq!(LeitnerConfig::new(vec![]).unwrap_err(), SettingsError::NoBoxes);
        assert_eq!(
            LeitnerConfig::new(vec![1, 0]).unwrap_err(),
            SettingsError::ZeroInterval { box_number: 1 }
        );
        assert_eq!(
            LeitnerConfig::new(vec![1, 4, 2]).unwrap_err(),
            SettingsError::DecreasingInterval { box_number: 2 }
        );
        assert_eq!(
            LeitnerConfig::new(vec![1, 2, 3]).unwrap_err(),
            SettingsError::NonNestedInterval { box_number: 2 }
        );
        assert!(matches!(
            LeitnerConfig::doubling(33),
            Err(SettingsError::TooManyBoxes { provided: 33, .. })
        ));
        assert!(LeitnerConfig::doubling(32).is_ok());
    }

    #[test]
    fn correct_answer_climbs_one_box_and_caps_at_top() {
        let s = BoxScheduler::default();
        for b in 0..s.max_box() {
            assert_eq!(s.next_box(b, AnswerOutcome::Correct).unwrap(), b + 1);
        }
        assert_eq!(s.next_box(4, AnswerOutcome::Correct).unwrap(), 4);
    }

    #[test]
    fn incorrect_answer_resets_to_box_zero() {
        let s = BoxScheduler::default();
        for b in 0..=s.max_box() {
            assert_eq!(s.next_box(b, AnswerOutcome::Incorrect).unwrap(), 0);
        }
    }

    #[test]
    fn out_of_range_box_is_invalid_state() {
        let s = BoxScheduler::default();
        assert_eq!(
            s.next_box(5, AnswerOutcome::Correct).unwrap_err(),
            SchedulerError::BoxOutOfRange {
                box_number: 5,
                max_box: 4
            }
        );
        assert!(s.is_due(9, 1).is_err());
        assert!(s.select_due_cards(&[], 5).is_err());

        let mut stray = card(1, 7);
        assert!(s.record_answer(&mut stray, "Helsinki").is_err());
        assert_eq!(stray.box_number(), 7);
    }

    #[test]
    fn helsinki_scenario() {
        let s = BoxScheduler::default();

        let mut right = card(1, 1);
        assert_eq!(s.record_answer(&mut right, "Helsinki").unwrap(), 2);
        assert_eq!(right.box_number(), 2);

        let mut wrong = card(2, 1);
        let applied = s.apply_answer(&mut wrong, "Tokyo").unwrap();
        assert_eq!(applied.outcome, AnswerOutcome::Incorrect);
        assert_eq!(applied.box_number, 0);
        assert!(applied.reset());
        assert!(!applied.promoted());
        assert_eq!(wrong.box_number(), 0);
    }

    #[test]
    fn select_due_cards_takes_only_the_round_box() {
        let s = BoxScheduler::default();
        let cards = vec![card(1, 0), card(2, 1), card(3, 0), card(4, 4)];

        let due = s.select_due_cards(&cards, 0).unwrap();
        let ids: Vec<u64> = due.iter().map(|c| c.id().value()).collect();
        assert_eq!(ids, vec![1, 3]);

        let due = s.select_due_cards(&cards, 4).unwrap();
        assert_eq!(due.len(), 1);
        assert!(s.select_due_cards(&cards, 2).unwrap().is_empty());
    }

    #[test]
    fn lower_boxes_are_reviewed_at_least_as_often() {
        let s = BoxScheduler::default();
        let rounds = 1..=64_u32;
        let mut previous = u32::MAX;
        for b in 0..=s.max_box() {
            let reviews = rounds
                .clone()
                .filter(|&r| s.is_due(b, r).unwrap())
                .count() as u32;
            assert!(reviews <= previous, "box {b} reviewed {reviews} times");
            previous = reviews;
        }

        for r in 1..=64 {
            for b in 1..=s.max_box() {
                if s.is_due(b, r).unwrap() {
                    assert!(s.is_due(b - 1, r).unwrap());
                }
            }
        }
    }

    #[test]
    fn due_boxes_follow_doubling_cadence() {
        let s = BoxScheduler::default();
        assert_eq!(s.due_boxes(1), vec![0]);
        assert_eq!(s.due_boxes(2), vec![0, 1]);
        assert_eq!(s.due_boxes(4), vec![0, 1, 2]);
        assert_eq!(s.due_boxes(16), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cards_for_round_orders_lowest_box_first() {
        let s = BoxScheduler::default();
        let cards = vec![card(1, 2), card(2, 1), card(3, 0), card(4, 1), card(5, 9)];

        let ids: Vec<u64> = s
            .cards_for_round(&cards, 4)
            .iter()
            .map(|c| c.id().value())
            .collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);

        let ids: Vec<u64> = s
            .cards_for_round(&cards, 1)
            .iter()
            .map(|c| c.id().value())
            .collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn custom_intervals_drive_is_due() {
        let s = BoxScheduler::new(LeitnerConfig::new(vec![1, 3, 3]).unwrap());
        assert_eq!(s.max_box(), 2);
        assert!(s.is_due(1, 3).unwrap());
        assert!(!s.is_due(2, 4).unwrap());
        assert_eq!(s.due_boxes(6), vec![0, 1, 2]);

        let s = BoxScheduler::new(LeitnerConfig::new(vec![1, 2, 6]).unwrap());
        assert_eq!(s.due_boxes(3), vec![0]);
        assert_eq!(s.due_boxes(4), vec![0, 1]);
        assert_eq!(s.due_boxes(6), vec![0, 1, 2]);
        for round in 0..24 {
            let due = s.due_boxes(round);
            let expected: Vec<u32> = (0..u32::try_from(due.len()).unwrap()).collect();
            assert_eq!(due, expected, "round {round} skips a lower box");
        }
    }
}
