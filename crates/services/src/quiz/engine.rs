use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use quiz_core::countdown::{Countdown, CountdownTick};
use quiz_core::model::{OPTION_COUNT, Question, QuestionSet, QuizResult, QuizSettings};

use crate::error::QuizError;

//
// ─── GENERATION ────────────────────────────────────────────────────────────────
//

/// Monotonic id distinguishing the current session run from prior
/// (restarted) runs.
///
/// Scheduled advance callbacks carry the generation they were created
/// under; the engine discards any callback whose generation no longer
/// matches, so a restart can never be mutated by a leftover timer from the
/// run it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionGeneration(u64);

impl SessionGeneration {
    fn first() -> Self {
        Self(0)
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Coarse status of a session. Timeout handling is transient and lives in
/// the lock, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizPhase {
    Active,
    Completed,
}

//
// ─── TRANSITION OUTCOMES ───────────────────────────────────────────────────────
//

/// Advance scheduled after a question resolves.
///
/// The host sleeps for `delay_secs`, then feeds `generation` back through
/// [`QuizEngine::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub delay_secs: u32,
    pub generation: SessionGeneration,
}

/// Outcome of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The selection was recorded and the transition lock engaged.
    Accepted {
        is_correct: bool,
        advance: PendingAdvance,
    },
    /// The lock was already held or the question already answered; the
    /// first writer won and this event changed nothing.
    Ignored,
}

/// Outcome of a timer expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// The question timed out unanswered and the transition lock engaged.
    TimedOut { advance: PendingAdvance },
    /// The question resolved before the expiry arrived; discarded.
    Ignored,
}

/// Outcome of consuming one countdown second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown still running; carries seconds remaining.
    Running(u32),
    /// The countdown reached zero and the question resolved as a timeout.
    TimedOut { advance: PendingAdvance },
    /// Nothing to count: locked, completed, or the countdown is finished.
    Idle,
}

/// Outcome of a scheduled advance callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved on to the next question.
    NextQuestion { index: usize },
    /// Advanced past the last question; the session is complete.
    Completed(QuizResult),
    /// Callback from a restarted or already-advanced run; discarded with no
    /// state change.
    Stale,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Session state machine for one lesson's timed quiz.
///
/// Every external wake-up — an answer click, a countdown tick, a timer
/// expiry, a scheduled advance — enters through one of the methods below,
/// and the caller is expected to serialize those calls (single thread or a
/// single task). The `locked` flag turns the "expiry races a click" hazard
/// into first-writer-wins; the generation counter turns "advance races a
/// restart" into discard-if-stale.
pub struct QuizEngine {
    questions: QuestionSet,
    settings: QuizSettings,
    current: usize,
    score: u32,
    selected: Option<usize>,
    is_correct: Option<bool>,
    timed_out: bool,
    countdown: Countdown,
    locked: bool,
    phase: QuizPhase,
    generation: SessionGeneration,
    result: Option<QuizResult>,
    result_recorded: bool,
}

impl QuizEngine {
    /// Create a session in `Active(0)` with the countdown running.
    #[must_use]
    pub fn new(questions: QuestionSet, settings: QuizSettings) -> Self {
        let countdown = Countdown::start(settings.question_duration_secs());
        Self {
            questions,
            settings,
            current: 0,
            score: 0,
            selected: None,
            is_correct: None,
            timed_out: false,
            countdown,
            locked: false,
            phase: QuizPhase::Active,
            generation: SessionGeneration::first(),
            result: None,
            result_recorded: false,
        }
    }

    /// Record the user's answer for the current question.
    ///
    /// While the transition lock is held, or once a selection exists, the
    /// call is an accepted no-op (`Ignored`); that is the guard against a
    /// double resolution when an expiry and a click land close together.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidAnswerIndex` for an out-of-range index
    /// (no state change) and `QuizError::SessionCompleted` after the last
    /// question has resolved.
    pub fn submit_answer(&mut self, option_index: usize) -> Result<AnswerOutcome, QuizError> {
        if option_index >= OPTION_COUNT {
            return Err(QuizError::InvalidAnswerIndex {
                provided: option_index,
                max: OPTION_COUNT - 1,
            });
        }
        if self.phase == QuizPhase::Completed {
            return Err(QuizError::SessionCompleted);
        }
        if self.locked || self.selected.is_some() {
            debug!(
                "ignoring answer {option_index} for question {}: already resolved",
                self.current
            );
            return Ok(AnswerOutcome::Ignored);
        }
        let Some(question) = self.questions.question(self.current) else {
            return Err(QuizError::SessionCompleted);
        };
        let is_correct = question.is_correct(option_index);

        self.countdown.cancel();
        self.selected = Some(option_index);
        self.is_correct = Some(is_correct);
        if is_correct {
            self.score += 1;
        }

        Ok(AnswerOutcome::Accepted {
            is_correct,
            advance: self.engage_lock(),
        })
    }

    /// Resolve the current question as a timeout.
    ///
    /// Valid only while `Active` and unlocked; a late expiry that arrives
    /// after an answer (or after another expiry) is `Ignored`.
    pub fn handle_expiry(&mut self) -> ExpiryOutcome {
        if self.phase == QuizPhase::Completed || self.locked || self.selected.is_some() {
            debug!(
                "ignoring expiry for question {}: already resolved",
                self.current
            );
            return ExpiryOutcome::Ignored;
        }

        self.countdown.cancel();
        self.timed_out = true;
        self.is_correct = Some(false);

        ExpiryOutcome::TimedOut {
            advance: self.engage_lock(),
        }
    }

    /// Consume one elapsed second of the current question's countdown.
    ///
    /// Reaching zero resolves the timeout through the same path as
    /// [`Self::handle_expiry`], so a manual-tick test harness and a real
    /// clock observe identical transitions.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase == QuizPhase::Completed || self.locked {
            return TickOutcome::Idle;
        }
        match self.countdown.tick() {
            CountdownTick::Running(remaining) => TickOutcome::Running(remaining),
            CountdownTick::Expired => match self.handle_expiry() {
                ExpiryOutcome::TimedOut { advance } => TickOutcome::TimedOut { advance },
                ExpiryOutcome::Ignored => TickOutcome::Idle,
            },
            CountdownTick::Idle => TickOutcome::Idle,
        }
    }

    /// Apply a scheduled advance.
    ///
    /// A generation mismatch, an unheld lock, or a completed session marks
    /// the callback stale; stale callbacks are discarded, not errors.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Result` if the final result fails validation;
    /// unreachable while the scoring invariants hold.
    pub fn advance(&mut self, generation: SessionGeneration) -> Result<AdvanceOutcome, QuizError> {
        if generation != self.generation || !self.locked || self.phase == QuizPhase::Completed {
            debug!(
                "discarding stale advance (callback generation {}, session generation {})",
                generation.value(),
                self.generation.value()
            );
            return Ok(AdvanceOutcome::Stale);
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            self.is_correct = None;
            self.timed_out = false;
            self.locked = false;
            self.countdown = Countdown::start(self.settings.question_duration_secs());
            Ok(AdvanceOutcome::NextQuestion {
                index: self.current,
            })
        } else {
            let result = QuizResult::new(
                self.questions.lesson_id(),
                self.score,
                self.questions.total(),
            )?;
            self.countdown.cancel();
            self.phase = QuizPhase::Completed;
            self.result = Some(result.clone());
            Ok(AdvanceOutcome::Completed(result))
        }
    }

    /// Reinitialize the session to `Active(0)`.
    ///
    /// Bumps the generation so any advance still scheduled against the
    /// previous run is discarded when it fires. Does not touch previously
    /// persisted progress.
    pub fn restart(&mut self) {
        self.generation = self.generation.next();
        self.current = 0;
        self.score = 0;
        self.selected = None;
        self.is_correct = None;
        self.timed_out = false;
        self.locked = false;
        self.phase = QuizPhase::Active;
        self.countdown = Countdown::start(self.settings.question_duration_secs());
        self.result = None;
        self.result_recorded = false;
    }

    fn engage_lock(&mut self) -> PendingAdvance {
        self.locked = true;
        PendingAdvance {
            delay_secs: self.settings.transition_delay_secs(),
            generation: self.generation,
        }
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == QuizPhase::Completed {
            None
        } else {
            self.questions.question(self.current)
        }
    }

    #[must_use]
    pub fn question_set(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Seconds left on the current question's countdown.
    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    #[must_use]
    pub fn generation(&self) -> SessionGeneration {
        self.generation
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// The final result, present once the session has completed.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// Whether the final result has been handed to the progress gateway.
    #[must_use]
    pub fn result_recorded(&self) -> bool {
        self.result_recorded
    }

    pub(crate) fn mark_result_recorded(&mut self) {
        self.result_recorded = true;
    }
}

impl fmt::Debug for QuizEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizEngine")
            .field("lesson_id", &self.questions.lesson_id())
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("locked", &self.locked)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::LessonId;

    fn options() -> Vec<String> {
        vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
        ]
    }

    fn build_set(correct: &[usize]) -> QuestionSet {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, &c)| Question::new(format!("Q{i}"), options(), c).unwrap())
            .collect();
        QuestionSet::new(LessonId::new(1), questions).unwrap()
    }

    fn build_engine(correct: &[usize]) -> QuizEngine {
        QuizEngine::new(build_set(correct), QuizSettings::default())
    }

    fn resolve_and_advance(engine: &mut QuizEngine, answer: Option<usize>) -> AdvanceOutcome {
        let advance = match answer {
            Some(index) => match engine.submit_answer(index).unwrap() {
                AnswerOutcome::Accepted { advance, .. } => advance,
                AnswerOutcome::Ignored => panic!("answer unexpectedly ignored"),
            },
            None => match engine.handle_expiry() {
                ExpiryOutcome::TimedOut { advance } => advance,
                ExpiryOutcome::Ignored => panic!("expiry unexpectedly ignored"),
            },
        };
        engine.advance(advance.generation).unwrap()
    }

    #[test]
    fn starts_active_with_full_countdown() {
        let engine = build_engine(&[1, 0, 2]);
        assert_eq!(engine.phase(), QuizPhase::Active);
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.time_remaining(), 30);
        assert!(!engine.is_locked());
        assert_eq!(engine.selected_option(), None);
    }

    #[test]
    fn full_pass_with_all_correct_answers() {
        let mut engine = build_engine(&[1, 0, 2]);

        assert_eq!(
            resolve_and_advance(&mut engine, Some(1)),
            AdvanceOutcome::NextQuestion { index: 1 }
        );
        assert_eq!(
            resolve_and_advance(&mut engine, Some(0)),
            AdvanceOutcome::NextQuestion { index: 2 }
        );
        let outcome = resolve_and_advance(&mut engine, Some(2));
        let AdvanceOutcome::Completed(result) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };

        assert_eq!(result.score(), 3);
        assert_eq!(result.total(), 3);
        assert!(engine.is_complete());
        assert_eq!(engine.result(), Some(&result));
    }

    #[test]
    fn timeout_counts_zero_for_that_question() {
        let mut engine = build_engine(&[1, 0, 2]);

        resolve_and_advance(&mut engine, Some(1));
        // question 2 times out unanswered
        resolve_and_advance(&mut engine, None);
        let outcome = resolve_and_advance(&mut engine, Some(2));

        let AdvanceOutcome::Completed(result) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(result.score(), 2);
        assert_eq!(result.total(), 3);
    }

    #[test]
    fn wrong_answer_does_not_score() {
        let mut engine = build_engine(&[1]);
        let outcome = engine.submit_answer(3).unwrap();
        assert!(matches!(
            outcome,
            AnswerOutcome::Accepted {
                is_correct: false,
                ..
            }
        ));
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.selected_option(), Some(3));
    }

    #[test]
    fn answer_cancels_countdown_and_locks() {
        let mut engine = build_engine(&[1, 0]);
        engine.submit_answer(1).unwrap();

        assert!(engine.is_locked());
        // countdown is cancelled; ticks are inert while locked
        assert_eq!(engine.tick(), TickOutcome::Idle);
    }

    #[test]
    fn expiry_after_answer_is_ignored() {
        let mut engine = build_engine(&[1, 0]);
        let outcome = engine.submit_answer(1).unwrap();
        assert!(matches!(outcome, AnswerOutcome::Accepted { .. }));

        // a racing expiry lands after the answer took the lock
        assert_eq!(engine.handle_expiry(), ExpiryOutcome::Ignored);
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.selected_option(), Some(1));
        assert!(!engine.timed_out());
    }

    #[test]
    fn answer_after_expiry_is_ignored() {
        let mut engine = build_engine(&[1, 0]);
        let outcome = engine.handle_expiry();
        assert!(matches!(outcome, ExpiryOutcome::TimedOut { .. }));

        assert_eq!(engine.submit_answer(1).unwrap(), AnswerOutcome::Ignored);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.selected_option(), None);
        assert!(engine.timed_out());
    }

    #[test]
    fn second_answer_for_same_question_is_ignored() {
        let mut engine = build_engine(&[1, 0]);
        engine.submit_answer(1).unwrap();
        assert_eq!(engine.submit_answer(2).unwrap(), AnswerOutcome::Ignored);
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.selected_option(), Some(1));
    }

    #[test]
    fn out_of_range_index_is_rejected_without_state_change() {
        let mut engine = build_engine(&[1, 0]);
        let err = engine.submit_answer(OPTION_COUNT).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidAnswerIndex { provided, max }
                if provided == OPTION_COUNT && max == OPTION_COUNT - 1
        ));

        assert_eq!(engine.selected_option(), None);
        assert!(!engine.is_locked());
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn tick_counts_down_and_resolves_timeout() {
        let set = build_set(&[0]);
        let mut engine = QuizEngine::new(set, QuizSettings::new(3, 2).unwrap());

        assert_eq!(engine.tick(), TickOutcome::Running(2));
        assert_eq!(engine.tick(), TickOutcome::Running(1));
        let outcome = engine.tick();
        let TickOutcome::TimedOut { advance } = outcome else {
            panic!("expected timeout, got {outcome:?}");
        };
        assert!(engine.is_locked());
        assert!(engine.timed_out());

        // a single question: the advance completes with score 0
        let advanced = engine.advance(advance.generation).unwrap();
        let AdvanceOutcome::Completed(result) = advanced else {
            panic!("expected completion, got {advanced:?}");
        };
        assert_eq!(result.score(), 0);
        assert_eq!(result.total(), 1);
    }

    #[test]
    fn advance_without_resolution_is_stale() {
        let mut engine = build_engine(&[1, 0]);
        let generation = engine.generation();
        assert_eq!(engine.advance(generation).unwrap(), AdvanceOutcome::Stale);
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn duplicate_advance_is_stale() {
        let mut engine = build_engine(&[1, 0]);
        let AnswerOutcome::Accepted { advance, .. } = engine.submit_answer(1).unwrap() else {
            panic!("answer should be accepted");
        };
        assert_eq!(
            engine.advance(advance.generation).unwrap(),
            AdvanceOutcome::NextQuestion { index: 1 }
        );
        // the same callback firing twice must not advance again
        assert_eq!(
            engine.advance(advance.generation).unwrap(),
            AdvanceOutcome::Stale
        );
        assert_eq!(engine.current_index(), 1);
    }

    #[test]
    fn restart_reinitializes_and_discards_pending_advance() {
        let mut engine = build_engine(&[1, 0]);
        let AnswerOutcome::Accepted { advance, .. } = engine.submit_answer(1).unwrap() else {
            panic!("answer should be accepted");
        };
        assert_eq!(engine.score(), 1);

        engine.restart();
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.score(), 0);
        assert!(!engine.is_locked());
        assert_eq!(engine.selected_option(), None);
        assert_eq!(engine.time_remaining(), 30);
        assert_eq!(engine.phase(), QuizPhase::Active);

        // the pending advance from the previous run is a zombie now
        assert_eq!(
            engine.advance(advance.generation).unwrap(),
            AdvanceOutcome::Stale
        );
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn restart_after_completion_allows_a_fresh_run() {
        let mut engine = build_engine(&[1]);
        let outcome = resolve_and_advance(&mut engine, Some(1));
        assert!(matches!(outcome, AdvanceOutcome::Completed(_)));

        engine.restart();
        assert!(!engine.is_complete());
        assert_eq!(engine.result(), None);
        assert!(!engine.result_recorded());

        let outcome = resolve_and_advance(&mut engine, None);
        let AdvanceOutcome::Completed(result) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(result.score(), 0);
    }

    #[test]
    fn submit_after_completion_is_an_error() {
        let mut engine = build_engine(&[1]);
        resolve_and_advance(&mut engine, Some(1));

        let err = engine.submit_answer(1).unwrap_err();
        assert!(matches!(err, QuizError::SessionCompleted));
    }

    #[test]
    fn expiry_after_completion_is_ignored() {
        let mut engine = build_engine(&[1]);
        resolve_and_advance(&mut engine, Some(1));
        assert_eq!(engine.handle_expiry(), ExpiryOutcome::Ignored);
        assert_eq!(engine.tick(), TickOutcome::Idle);
    }

    #[test]
    fn score_is_monotonic_across_mixed_resolutions() {
        let mut engine = build_engine(&[0, 1, 2, 3]);
        let mut last_score = 0;

        for answer in [Some(0), None, Some(0), Some(3)] {
            resolve_and_advance(&mut engine, answer);
            assert!(engine.score() >= last_score);
            assert!(engine.score() <= last_score + 1);
            last_score = engine.score();
        }

        // q0 correct, q1 timeout, q2 wrong, q3 correct
        assert_eq!(engine.result().unwrap().score(), 2);
    }
}
