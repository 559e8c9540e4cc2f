use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{LessonId, QuestionSet, QuizResult, QuizResultError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a lesson's quiz result.
///
/// This mirrors the domain `QuizResult` plus the write timestamp, so
/// repositories can serialize/deserialize without leaking storage concerns
/// into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub lesson_id: LessonId,
    pub score: u32,
    pub total: u32,
    pub recorded_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_result(result: &QuizResult, recorded_at: DateTime<Utc>) -> Self {
        Self {
            lesson_id: result.lesson_id(),
            score: result.score(),
            total: result.total(),
            recorded_at,
        }
    }

    /// Convert the record back into a domain `QuizResult`.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if the persisted score/total pair fails
    /// validation.
    pub fn into_result(self) -> Result<QuizResult, QuizResultError> {
        QuizResult::new(self.lesson_id, self.score, self.total)
    }
}

/// Gateway contract for the external progress store.
///
/// The engine calls `record_result` exactly once per completed run; the
/// store keeps one record per lesson with last-write-wins overwrite.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Upsert the final result for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn record_result(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Fetch the persisted result for a lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; a missing record is
    /// `Ok(None)`, not an error.
    async fn get_progress(&self, lesson_id: LessonId)
    -> Result<Option<ProgressRecord>, StorageError>;

    /// List all persisted results, ordered by lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Lesson-catalog contract the engine consumes.
///
/// Content storage itself belongs to an external collaborator; the engine
/// only needs the ordered question set for one lesson.
#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// Load the ordered question set for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the lesson has no quiz, or
    /// other storage errors.
    async fn load_questions(&self, lesson_id: LessonId) -> Result<QuestionSet, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<LessonId, ProgressRecord>>>,
    catalog: Arc<Mutex<HashMap<LessonId, QuestionSet>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress: Arc::new(Mutex::new(HashMap::new())),
            catalog: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seed the catalog with a question set; replaces any prior set for the
    /// same lesson. Content editing is an external concern, so this lives on
    /// the fake rather than on `QuestionCatalog`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the catalog lock is poisoned.
    pub fn insert_question_set(&self, set: QuestionSet) -> Result<(), StorageError> {
        let mut guard = self
            .catalog
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(set.lesson_id(), set);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn record_result(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.lesson_id, record.clone());
        Ok(())
    }

    async fn get_progress(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&lesson_id).cloned())
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by_key(|r| r.lesson_id);
        Ok(records)
    }
}

#[async_trait]
impl QuestionCatalog for InMemoryRepository {
    async fn load_questions(&self, lesson_id: LessonId) -> Result<QuestionSet, StorageError> {
        let guard = self
            .catalog
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&lesson_id).cloned().ok_or(StorageError::NotFound)
    }
}

/// Aggregates the progress store and lesson catalog behind trait objects for
/// easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub catalog: Arc<dyn QuestionCatalog>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let catalog: Arc<dyn QuestionCatalog> = Arc::new(repo);
        Self { progress, catalog }
    }
}
