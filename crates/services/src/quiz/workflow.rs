use std::sync::Arc;

use log::{debug, info};

use quiz_core::Clock;
use quiz_core::model::{LessonId, QuizResult, QuizSettings};
use storage::repository::{ProgressRecord, ProgressRepository, QuestionCatalog, StorageError};

use super::engine::{AdvanceOutcome, AnswerOutcome, ExpiryOutcome, QuizEngine, SessionGeneration};
use crate::error::QuizError;

/// Subscriber for natural quiz completions (e.g. the points/gamification
/// collaborator). Fired once per completed run, never on restart alone.
pub trait CompletionListener: Send + Sync {
    fn on_completed(&self, result: &QuizResult);
}

/// Orchestrates session start, the scheduled advance, and exactly-once
/// result persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    catalog: Arc<dyn QuestionCatalog>,
    progress: Arc<dyn ProgressRepository>,
    settings: QuizSettings,
    listeners: Vec<Arc<dyn CompletionListener>>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn QuestionCatalog>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            progress,
            settings: QuizSettings::default(),
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_completion_listener(mut self, listener: Arc<dyn CompletionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Start a new session for the given lesson.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuizAvailable` if the lesson has no question
    /// set, or `QuizError::Storage` for other catalog failures. No session
    /// state is created on error.
    pub async fn start_session(&self, lesson_id: LessonId) -> Result<QuizEngine, QuizError> {
        let questions = match self.catalog.load_questions(lesson_id).await {
            Ok(set) => set,
            Err(StorageError::NotFound) => {
                return Err(QuizError::NoQuizAvailable { lesson_id });
            }
            Err(e) => return Err(QuizError::Storage(e)),
        };

        debug!(
            "starting quiz for lesson {lesson_id} with {} questions",
            questions.len()
        );
        Ok(QuizEngine::new(questions, self.settings.clone()))
    }

    /// Record the user's answer for the current question.
    ///
    /// Pure engine transition; nothing is persisted before completion.
    ///
    /// # Errors
    ///
    /// Propagates `QuizError::InvalidAnswerIndex` and
    /// `QuizError::SessionCompleted` from the engine.
    pub fn submit_answer(
        &self,
        engine: &mut QuizEngine,
        option_index: usize,
    ) -> Result<AnswerOutcome, QuizError> {
        engine.submit_answer(option_index)
    }

    /// Resolve the current question as a timeout.
    pub fn handle_expiry(&self, engine: &mut QuizEngine) -> ExpiryOutcome {
        engine.handle_expiry()
    }

    /// Apply a scheduled advance; on the completion transition, notify
    /// listeners and upsert the result through the progress gateway.
    ///
    /// Listeners fire when the engine first enters `Completed`, before the
    /// persistence attempt, so consumers are not coupled to storage health.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` when the completion write fails; the
    /// engine stays `Completed` and the write can be retried with
    /// [`Self::finalize_result`].
    pub async fn advance(
        &self,
        engine: &mut QuizEngine,
        generation: SessionGeneration,
    ) -> Result<AdvanceOutcome, QuizError> {
        let outcome = engine.advance(generation)?;

        if let AdvanceOutcome::Completed(result) = &outcome {
            info!(
                "quiz completed for lesson {}: {}/{}",
                result.lesson_id(),
                result.score(),
                result.total()
            );
            for listener in &self.listeners {
                listener.on_completed(result);
            }
            self.persist_result(engine).await?;
        }

        Ok(outcome)
    }

    /// Retry result persistence after a completed session.
    ///
    /// This is useful when the completion write failed (e.g. transient
    /// storage error). Idempotent once the write has succeeded.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotCompleted` if the session has not finished,
    /// or `QuizError::Storage` if persistence fails again.
    pub async fn finalize_result(&self, engine: &mut QuizEngine) -> Result<(), QuizError> {
        if engine.result_recorded() {
            return Ok(());
        }
        if !engine.is_complete() {
            return Err(QuizError::NotCompleted);
        }
        self.persist_result(engine).await
    }

    /// Reinitialize the session. Previously persisted progress is kept; it
    /// is only overwritten by a future natural completion.
    pub fn restart(&self, engine: &mut QuizEngine) {
        debug!(
            "restarting quiz for lesson {}",
            engine.question_set().lesson_id()
        );
        engine.restart();
    }

    async fn persist_result(&self, engine: &mut QuizEngine) -> Result<(), QuizError> {
        let Some(result) = engine.result().cloned() else {
            return Err(QuizError::NotCompleted);
        };
        let record = ProgressRecord::from_result(&result, self.clock.now());
        self.progress.record_result(&record).await?;
        engine.mark_result_recorded();
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
