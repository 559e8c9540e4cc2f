use serde::Serialize;

use super::engine::{QuizEngine, QuizPhase};

/// Presentation-facing view of the current question.
///
/// The correct index is deliberately absent; the adapter learns correctness
/// through [`QuizSnapshot::is_correct`] after the question resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<String>,
}

/// Read-only snapshot of a session for the presentation adapter.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no layout or styling assumptions
///
/// The adapter renders it however it likes and feeds commands back through
/// the engine's `submit_answer`/`restart`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSnapshot {
    pub current_index: usize,
    pub total: usize,
    pub score: u32,
    pub selected_option: Option<usize>,
    pub time_remaining: u32,
    pub phase: QuizPhase,
    pub is_correct: Option<bool>,
    pub timed_out: bool,
    pub locked: bool,
    pub question: Option<QuestionView>,
}

impl QuizSnapshot {
    #[must_use]
    pub fn from_engine(engine: &QuizEngine) -> Self {
        let question = engine.current_question().map(|q| QuestionView {
            text: q.text().to_owned(),
            options: q.options().to_vec(),
        });

        Self {
            current_index: engine.current_index(),
            total: engine.total_questions(),
            score: engine.score(),
            selected_option: engine.selected_option(),
            time_remaining: engine.time_remaining(),
            phase: engine.phase(),
            is_correct: engine.is_correct(),
            timed_out: engine.timed_out(),
            locked: engine.is_locked(),
            question,
        }
    }
}
