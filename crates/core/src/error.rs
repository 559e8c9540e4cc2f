use thiserror::Error;

use crate::model::{QuestionError, QuizResultError, QuizSettingsError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] QuizResultError),
    #[error(transparent)]
    Settings(#[from] QuizSettingsError),
}
