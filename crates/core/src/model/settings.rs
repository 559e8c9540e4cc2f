use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default per-question answering window, in seconds.
pub const DEFAULT_QUESTION_DURATION_SECS: u32 = 30;

/// Default pause between resolving a question and advancing, in seconds.
pub const DEFAULT_TRANSITION_DELAY_SECS: u32 = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("question duration must be > 0 seconds")]
    InvalidQuestionDuration,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Timing configuration for a quiz session.
///
/// The transition delay may be zero, which advances immediately after a
/// question resolves; useful in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    question_duration_secs: u32,
    transition_delay_secs: u32,
}

impl QuizSettings {
    /// Build validated settings.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError::InvalidQuestionDuration` if the question
    /// duration is zero.
    pub fn new(
        question_duration_secs: u32,
        transition_delay_secs: u32,
    ) -> Result<Self, QuizSettingsError> {
        if question_duration_secs == 0 {
            return Err(QuizSettingsError::InvalidQuestionDuration);
        }
        Ok(Self {
            question_duration_secs,
            transition_delay_secs,
        })
    }

    #[must_use]
    pub fn question_duration_secs(&self) -> u32 {
        self.question_duration_secs
    }

    #[must_use]
    pub fn transition_delay_secs(&self) -> u32 {
        self.transition_delay_secs
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            question_duration_secs: DEFAULT_QUESTION_DURATION_SECS,
            transition_delay_secs: DEFAULT_TRANSITION_DELAY_SECS,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
