use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::LessonId;
use storage::repository::{ProgressRecord, ProgressRepository};

use crate::error::QuizError;

/// Presentation-agnostic progress entry for one lesson.
///
/// Only the raw score/total pair is surfaced; whether a lesson counts as
/// "completed" at some percentage is a consumer policy, not engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonProgressItem {
    pub lesson_id: LessonId,
    pub score: u32,
    pub total: u32,
    pub recorded_at: DateTime<Utc>,
}

impl LessonProgressItem {
    #[must_use]
    pub fn from_record(record: &ProgressRecord) -> Self {
        Self {
            lesson_id: record.lesson_id,
            score: record.score,
            total: record.total,
            recorded_at: record.recorded_at,
        }
    }
}

/// Progress-summary facade that hides the repository and time source from
/// the presentation side.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(
            clock,
            Arc::new(storage::repository::InMemoryRepository::new()),
        )
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fetch the persisted result for one lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on repository failures.
    pub async fn get_progress(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgressItem>, QuizError> {
        let record = self.progress.get_progress(lesson_id).await?;
        Ok(record.as_ref().map(LessonProgressItem::from_record))
    }

    /// List all persisted results, ordered by lesson.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on repository failures.
    pub async fn list_progress(&self) -> Result<Vec<LessonProgressItem>, QuizError> {
        let records = self.progress.list_progress().await?;
        Ok(records.iter().map(LessonProgressItem::from_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizResult;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn get_progress_maps_record() {
        let repo = InMemoryRepository::new();
        let result = QuizResult::new(LessonId::new(1), 2, 3).unwrap();
        repo.record_result(&ProgressRecord::from_result(&result, fixed_now()))
            .await
            .unwrap();

        let svc = ProgressService::new(fixed_clock(), Arc::new(repo));
        let item = svc.get_progress(LessonId::new(1)).await.unwrap().unwrap();

        assert_eq!(item.lesson_id, LessonId::new(1));
        assert_eq!(item.score, 2);
        assert_eq!(item.total, 3);
        assert_eq!(item.recorded_at, fixed_now());
    }

    #[tokio::test]
    async fn missing_lesson_yields_none() {
        let svc = ProgressService::in_memory(fixed_clock());
        assert!(svc.get_progress(LessonId::new(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_progress_returns_every_lesson() {
        let repo = InMemoryRepository::new();
        for lesson in 1..=3_u64 {
            let result = QuizResult::new(LessonId::new(lesson), 1, 2).unwrap();
            repo.record_result(&ProgressRecord::from_result(&result, fixed_now()))
                .await
                .unwrap();
        }

        let svc = ProgressService::new(fixed_clock(), Arc::new(repo));
        let items = svc.list_progress().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].lesson_id, LessonId::new(1));
    }
}
