//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{LessonId, QuestionError, QuizResultError, QuizSettingsError};
use storage::repository::StorageError;

/// Errors emitted by the quiz session services.
///
/// Timing races are not errors: a locked-out answer, a late expiry, or a
/// stale advance callback is reported as an `Ignored`/`Stale` outcome by the
/// engine, never through this enum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz available for lesson {lesson_id}")]
    NoQuizAvailable { lesson_id: LessonId },

    #[error("answer index {provided} out of range (max {max})")]
    InvalidAnswerIndex { provided: usize, max: usize },

    #[error("quiz session already completed")]
    SessionCompleted,

    #[error("quiz session not completed")]
    NotCompleted,

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Result(#[from] QuizResultError),

    #[error(transparent)]
    Settings(#[from] QuizSettingsError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
