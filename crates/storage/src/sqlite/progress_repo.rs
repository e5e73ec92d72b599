use chrono::{DateTime, Utc};
use elearn_core::model::{CourseId, LessonId, LessonProgress, UserId};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_completion_event_row, map_progress_row, u32_from_i64},
};
use crate::repository::{CompletionEvent, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let lesson = id_i64("lesson_id", lesson_id.value())?;

        let row = sqlx::query(
            r"
                SELECT user_id, lesson_id, is_completed, completed_at
                FROM lesson_progress
                WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(user)
        .bind(lesson)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        let user = id_i64("user_id", progress.user_id().value())?;
        let lesson = id_i64("lesson_id", progress.lesson_id().value())?;

        sqlx::query(
            r"
                INSERT INTO lesson_progress (user_id, lesson_id, is_completed, completed_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                    is_completed = excluded.is_completed,
                    completed_at = excluded.completed_at
            ",
        )
        .bind(user)
        .bind(lesson)
        .bind(progress.is_completed())
        .bind(progress.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn completed_count_for_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u32, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let course = id_i64("course_id", course_id.value())?;

        let count: i64 = sqlx::query_scalar(
            r"
                SELECT COUNT(*)
                FROM lesson_progress p
                JOIN lessons l ON l.id = p.lesson_id
                WHERE p.user_id = ?1 AND p.is_completed = 1 AND l.course_id = ?2
            ",
        )
        .bind(user)
        .bind(course)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        u32_from_i64("completed count", count)
    }

    async fn count_completed(&self, user_id: UserId) -> Result<u32, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lesson_progress WHERE user_id = ?1 AND is_completed = 1",
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        u32_from_i64("completed count", count)
    }

    async fn completed_since(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT user_id, lesson_id, is_completed, completed_at
                FROM lesson_progress
                WHERE user_id = ?1 AND is_completed = 1 AND completed_at >= ?2
            ",
        )
        .bind(user)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn progress_for_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let course = id_i64("course_id", course_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT p.user_id, p.lesson_id, p.is_completed, p.completed_at
                FROM lesson_progress p
                JOIN lessons l ON l.id = p.lesson_id
                WHERE p.user_id = ?1 AND l.course_id = ?2
            ",
        )
        .bind(user)
        .bind(course)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn completion_history(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<CompletionEvent>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT
                    p.lesson_id, l.title AS lesson_title,
                    c.id AS course_id, c.title AS course_title,
                    p.completed_at
                FROM lesson_progress p
                JOIN lessons l ON l.id = p.lesson_id
                JOIN courses c ON c.id = l.course_id
                WHERE p.user_id = ?1 AND p.is_completed = 1
            ",
        );

        let mut bind_index = 2;
        if course_id.is_some() {
            sql.push_str(" AND c.id = ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        if from.is_some() {
            sql.push_str(" AND p.completed_at >= ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        if until.is_some() {
            sql.push_str(" AND p.completed_at < ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        sql.push_str(" ORDER BY p.completed_at DESC, p.id DESC");
        sql.push_str(" LIMIT ?");
        sql.push_str(&bind_index.to_string());

        let mut query = sqlx::query(&sql).bind(id_i64("user_id", user_id.value())?);
        if let Some(course) = course_id {
            query = query.bind(id_i64("course_id", course.value())?);
        }
        if let Some(from) = from {
            query = query.bind(from);
        }
        if let Some(until) = until {
            query = query.bind(until);
        }
        query = query.bind(i64::from(limit));

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_completion_event_row(&row)?);
        }
        Ok(out)
    }
}
