#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::QuizError;
pub use quiz::{
    AdvanceOutcome, AnswerOutcome, CompletionListener, ExpiryOutcome, LessonProgressItem,
    PendingAdvance, ProgressService, QuestionView, QuizCommand, QuizEngine, QuizLoopService,
    QuizPhase, QuizSnapshot, SessionGeneration, TickOutcome, run_quiz,
};
