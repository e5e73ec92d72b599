use elearn_core::model::{CourseId, Enrollment, UserId};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_enrollment_row},
};
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let user_id = id_i64("user_id", enrollment.user_id().value())?;
        let course_id = id_i64("course_id", enrollment.course_id().value())?;

        sqlx::query(
            r"
                INSERT INTO enrollments (user_id, course_id, enrolled_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id, course_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(enrollment.enrolled_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let course = id_i64("course_id", course_id.value())?;

        let row = sqlx::query(
            r"
                SELECT user_id, course_id, enrolled_at
                FROM enrollments
                WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(user)
        .bind(course)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn enrollments_for_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT user_id, course_id, enrolled_at
                FROM enrollments
                WHERE user_id = ?1
                ORDER BY enrolled_at ASC, course_id ASC
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_enrollment_row(&row)?);
        }
        Ok(out)
    }
}
