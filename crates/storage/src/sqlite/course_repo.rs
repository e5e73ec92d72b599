use elearn_core::model::{Course, CourseId, Lesson, LessonId};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_course_row, map_lesson_row, u32_from_i64},
};
use crate::repository::{CourseRepository, LessonRepository, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let id = id_i64("course_id", course.id().value())?;

        sqlx::query(
            r"
                INSERT INTO courses (id, title, description, category, level, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    -- keep created_at from the original insert
                    title = excluded.title,
                    description = excluded.description,
                    category = excluded.category,
                    level = excluded.level
            ",
        )
        .bind(id)
        .bind(course.title())
        .bind(course.description())
        .bind(course.category())
        .bind(course.level())
        .bind(course.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let course_id = id_i64("course_id", id.value())?;

        let row = sqlx::query(
            r"
                SELECT id, title, description, category, level, created_at
                FROM courses
                WHERE id = ?1
            ",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn list_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, title, description, category, level, created_at
                FROM courses
                ORDER BY created_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_course_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let id = id_i64("lesson_id", lesson.id().value())?;
        let course_id = id_i64("course_id", lesson.course_id().value())?;

        sqlx::query(
            r"
                INSERT INTO lessons (id, course_id, title, content, sort_order)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    course_id = excluded.course_id,
                    title = excluded.title,
                    content = excluded.content,
                    sort_order = excluded.sort_order
            ",
        )
        .bind(id)
        .bind(course_id)
        .bind(lesson.title())
        .bind(lesson.content())
        .bind(i64::from(lesson.sort_order()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let lesson_id = id_i64("lesson_id", id.value())?;

        let row = sqlx::query(
            r"
                SELECT id, course_id, title, content, sort_order
                FROM lessons
                WHERE id = ?1
            ",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let course = id_i64("course_id", course_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT id, course_id, title, content, sort_order
                FROM lessons
                WHERE course_id = ?1
                ORDER BY sort_order ASC, id ASC
            ",
        )
        .bind(course)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_lesson_row(&row)?);
        }
        Ok(out)
    }

    async fn count_for_course(&self, course_id: CourseId) -> Result<u32, StorageError> {
        let course = id_i64("course_id", course_id.value())?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons WHERE course_id = ?1")
            .bind(course)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        u32_from_i64("lesson count", count)
    }
}
