use thiserror::Error;

use crate::choices::{ChoiceGenerator, DEFAULT_CHOICE_COUNT};
use crate::scheduler::LeitnerConfig;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("choice count must be > 0")]
    ZeroChoices,

    #[error("at least one box is required")]
    NoBoxes,

    #[error("at most {max} boxes are supported, got {provided}")]
    TooManyBoxes { provided: usize, max: usize },

    #[error("review interval of box {box_number} must be >= 1 round")]
    ZeroInterval { box_number: usize },

    #[error("box {box_number} is reviewed more often than the box below it")]
    DecreasingInterval { box_number: usize },

    #[error("review interval of box {box_number} must be a multiple of the box below it")]
    NonNestedInterval { box_number: usize },
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Quiz presentation and box configuration used by the training services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    choice_count: usize,
    leitner: LeitnerConfig,
}

impl QuizSettings {
    /// Build settings with a doubling review cadence over `box_count` boxes.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for a zero choice count or an unsupported box count.
    pub fn new(choice_count: usize, box_count: usize) -> Result<Self, SettingsError> {
        Self::with_leitner(choice_count, LeitnerConfig::doubling(box_count)?)
    }

    /// # Errors
    ///
    /// Returns `SettingsError::ZeroChoices` if `choice_count` is 0.
    pub fn with_leitner(choice_count: usize, leitner: LeitnerConfig) -> Result<Self, SettingsError> {
        if choice_count == 0 {
            return Err(SettingsError::ZeroChoices);
        }
        Ok(Self {
            choice_count,
            leitner,
        })
    }

    #[must_use]
    pub fn choice_count(&self) -> usize {
        self.choice_count
    }

    #[must_use]
    pub fn leitner(&self) -> &LeitnerConfig {
        &self.leitner
    }

    #[must_use]
    pub fn choice_generator(&self) -> ChoiceGenerator {
        ChoiceGenerator::with_count(self.choice_count)
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            choice_count: DEFAULT_CHOICE_COUNT,
            leitner: LeitnerConfig::default(),
        }
    }
}
