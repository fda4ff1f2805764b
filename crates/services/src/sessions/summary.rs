use chrono::{DateTime, Utc};

use quiz_core::model::DeckId;
use quiz_core::scheduler::AppliedAnswer;

/// Tally of one training round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub deck_id: DeckId,
    pub round: u32,
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    /// Cards that moved up a box.
    pub promoted: usize,
    /// Cards sent back to box 0 from a higher box.
    pub reset: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub(crate) fn from_results(
        deck_id: DeckId,
        round: u32,
        total: usize,
        results: &[AppliedAnswer],
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let correct = results.iter().filter(|r| r.outcome.is_correct()).count();
        Self {
            deck_id,
            round,
            total,
            correct,
            incorrect: results.len() - correct,
            promoted: results.iter().filter(|r| r.promoted()).count(),
            reset: results.iter().filter(|r| r.reset()).count(),
            started_at,
            completed_at,
        }
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.correct + self.incorrect
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}
