mod driver;
mod engine;
mod progress;
mod view;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use driver::{QuizCommand, run_quiz};
pub use engine::{
    AdvanceOutcome, AnswerOutcome, ExpiryOutcome, PendingAdvance, QuizEngine, QuizPhase,
    SessionGeneration, TickOutcome,
};
pub use progress::{LessonProgressItem, ProgressService};
pub use view::{QuestionView, QuizSnapshot};
pub use workflow::{CompletionListener, QuizLoopService};
