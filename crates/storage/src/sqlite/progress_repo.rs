use quiz_core::model::LessonId;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    u64::try_from(v)
        .map(LessonId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid lesson_id: {v}")))
}

fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let lesson_id = lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;

    Ok(ProgressRecord {
        lesson_id,
        score,
        total,
        recorded_at,
    })
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn record_result(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let lesson_id = id_i64("lesson_id", record.lesson_id.value())?;

        sqlx::query(
            r"
                INSERT INTO lesson_progress (lesson_id, score, total, recorded_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(lesson_id) DO UPDATE SET
                    score = excluded.score,
                    total = excluded.total,
                    recorded_at = excluded.recorded_at
            ",
        )
        .bind(lesson_id)
        .bind(i64::from(record.score))
        .bind(i64::from(record.total))
        .bind(record.recorded_at)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_progress(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT lesson_id, score, total, recorded_at
                FROM lesson_progress
                WHERE lesson_id = ?1
            ",
        )
        .bind(id_i64("lesson_id", lesson_id.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT lesson_id, score, total, recorded_at
                FROM lesson_progress
                ORDER BY lesson_id ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }

        Ok(out)
    }
}
