use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("expected {OPTION_COUNT} options, got {provided}")]
    WrongOptionCount { provided: usize },

    #[error("option {index} cannot be empty")]
    EmptyOption { index: usize },

    #[error("correct index must be below {OPTION_COUNT}, got {provided}")]
    CorrectIndexOutOfRange { provided: usize },

    #[error("question set cannot be empty")]
    EmptySet,

    #[error("too many questions for one lesson: {len}")]
    TooManyQuestions { len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
///
/// Immutable once constructed; the session never mutates it. The options are
/// an ordered sequence of exactly [`OPTION_COUNT`] entries and
/// `correct_index` always refers into that sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_index: usize,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is empty, the option count is not
    /// [`OPTION_COUNT`], any option is empty, or `correct_index` is out of
    /// range.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() != OPTION_COUNT {
            return Err(QuestionError::WrongOptionCount {
                provided: options.len(),
            });
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if correct_index >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange {
                provided: correct_index,
            });
        }

        Ok(Self {
            text,
            options,
            correct_index,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Whether the given option index answers this question correctly.
    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// Ordered, non-empty sequence of questions for one lesson.
///
/// Order is significant: question N's timer and result always refer to
/// index N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    lesson_id: LessonId,
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Build a question set for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySet` if no questions are provided.
    pub fn new(lesson_id: LessonId, questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptySet);
        }
        if u32::try_from(questions.len()).is_err() {
            return Err(QuestionError::TooManyQuestions {
                len: questions.len(),
            });
        }
        Ok(Self {
            lesson_id,
            questions,
        })
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    /// Number of questions; always at least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question count as the persisted `total`; the count is bounded at
    /// construction, so this never truncates.
    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec![
            "alpha".to_string(),
            "beta".to_string(),
            "gamma".to_string(),
            "delta".to_string(),
        ]
    }

    #[test]
    fn question_validates_fields() {
        let q = Question::new("Which one?", options(), 2).unwrap();
        assert_eq!(q.text(), "Which one?");
        assert_eq!(q.options().len(), OPTION_COUNT);
        assert_eq!(q.correct_index(), 2);
        assert!(q.is_correct(2));
        assert!(!q.is_correct(1));
    }

    #[test]
    fn question_rejects_empty_text() {
        let err = Question::new("  ", options(), 0).unwrap_err();
        assert!(matches!(err, QuestionError::EmptyText));
    }

    #[test]
    fn question_rejects_wrong_option_count() {
        let err = Question::new("Q", vec!["a".to_string()], 0).unwrap_err();
        assert!(matches!(
            err,
            QuestionError::WrongOptionCount { provided: 1 }
        ));
    }

    #[test]
    fn question_rejects_empty_option() {
        let mut opts = options();
        opts[3] = String::new();
        let err = Question::new("Q", opts, 0).unwrap_err();
        assert!(matches!(err, QuestionError::EmptyOption { index: 3 }));
    }

    #[test]
    fn question_rejects_out_of_range_correct_index() {
        let err = Question::new("Q", options(), OPTION_COUNT).unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectIndexOutOfRange { provided } if provided == OPTION_COUNT
        ));
    }

    #[test]
    fn question_set_rejects_empty() {
        let err = QuestionSet::new(LessonId::new(1), Vec::new()).unwrap_err();
        assert!(matches!(err, QuestionError::EmptySet));
    }

    #[test]
    fn question_set_preserves_order() {
        let q1 = Question::new("first", options(), 0).unwrap();
        let q2 = Question::new("second", options(), 1).unwrap();
        let set = QuestionSet::new(LessonId::new(1), vec![q1.clone(), q2.clone()]).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.question(0), Some(&q1));
        assert_eq!(set.question(1), Some(&q2));
        assert_eq!(set.question(2), None);
    }
}
