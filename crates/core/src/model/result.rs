use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("total must be > 0")]
    ZeroTotal,
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Final outcome of one completed quiz run.
///
/// Built exactly once per completed session and handed to the progress
/// gateway keyed by `lesson_id`. A later completion of the same lesson
/// overwrites the prior record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    lesson_id: LessonId,
    score: u32,
    total: u32,
}

impl QuizResult {
    /// Build a validated result.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::ZeroTotal` if `total` is zero, or
    /// `QuizResultError::ScoreExceedsTotal` if `score > total`.
    pub fn new(lesson_id: LessonId, score: u32, total: u32) -> Result<Self, QuizResultError> {
        if total == 0 {
            return Err(QuizResultError::ZeroTotal);
        }
        if score > total {
            return Err(QuizResultError::ScoreExceedsTotal { score, total });
        }
        Ok(Self {
            lesson_id,
            score,
            total,
        })
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Score as a percentage, for display. Not persisted; consumers that
    /// need a completion threshold apply their own policy.
    #[must_use]
    pub fn percent(&self) -> f64 {
        f64::from(self.score) / f64::from(self.total) * 100.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
