use chrono::{DateTime, Utc};
use elearn_core::model::{
    CourseId, LessonId, QuestionId, QuizResult, QuizResultDetail, ResultId, UserId,
};

use super::{
    SqliteRepository,
    mapping::{
        id_i64, map_attempt_event_row, map_detail_row, map_result_row, result_id_from_i64,
        u32_from_i64,
    },
};
use crate::repository::{QuizAttemptEvent, QuizAttemptRecord, ResultRepository, StorageError};

const ATTEMPT_EVENT_SELECT: &str = r"
    SELECT
        r.id, r.user_id, r.lesson_id, r.score, r.total_questions, r.taken_at,
        l.title AS lesson_title, l.sort_order AS lesson_sort_order,
        c.id AS course_id, c.title AS course_title
    FROM quiz_results r
    JOIN lessons l ON l.id = r.lesson_id
    JOIN courses c ON c.id = l.course_id
    WHERE r.user_id = ?1
";

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn record_attempt(&self, attempt: &QuizAttemptRecord) -> Result<ResultId, StorageError> {
        let user = id_i64("user_id", attempt.user_id.value())?;
        let lesson = id_i64("lesson_id", attempt.lesson_id.value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Shell row first so detail rows can reference its id; the score is
        // finalized after the details land. All within one transaction.
        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (user_id, lesson_id, score, total_questions, taken_at)
                VALUES (?1, ?2, 0, ?3, ?4)
            ",
        )
        .bind(user)
        .bind(lesson)
        .bind(i64::from(attempt.total_questions))
        .bind(attempt.taken_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let result_rowid = res.last_insert_rowid();

        for answer in &attempt.answers {
            sqlx::query(
                r"
                    INSERT INTO quiz_result_details (result_id, question_id, choice_id, is_correct)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(result_rowid)
            .bind(id_i64("question_id", answer.question_id.value())?)
            .bind(id_i64("choice_id", answer.choice_id.value())?)
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        sqlx::query("UPDATE quiz_results SET score = ?2 WHERE id = ?1")
            .bind(result_rowid)
            .bind(i64::from(attempt.score))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        result_id_from_i64(result_rowid)
    }

    async fn get_result(&self, id: ResultId) -> Result<Option<QuizResult>, StorageError> {
        let result = id_i64("result_id", id.value())?;

        let row = sqlx::query(
            r"
                SELECT id, user_id, lesson_id, score, total_questions, taken_at
                FROM quiz_results
                WHERE id = ?1
            ",
        )
        .bind(result)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_result_row).transpose()
    }

    async fn details_for_result(
        &self,
        id: ResultId,
    ) -> Result<Vec<QuizResultDetail>, StorageError> {
        let result = id_i64("result_id", id.value())?;

        let rows = sqlx::query(
            r"
                SELECT result_id, question_id, choice_id, is_correct
                FROM quiz_result_details
                WHERE result_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(result)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_detail_row(&row)?);
        }
        Ok(out)
    }

    async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT id, user_id, lesson_id, score, total_questions, taken_at
                FROM quiz_results
                WHERE user_id = ?1
                ORDER BY taken_at DESC, id DESC
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }

    async fn latest_for_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<QuizResult>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let lesson = id_i64("lesson_id", lesson_id.value())?;

        let row = sqlx::query(
            r"
                SELECT id, user_id, lesson_id, score, total_questions, taken_at
                FROM quiz_results
                WHERE user_id = ?1 AND lesson_id = ?2
                ORDER BY taken_at DESC, id DESC
                LIMIT 1
            ",
        )
        .bind(user)
        .bind(lesson)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_result_row).transpose()
    }

    async fn results_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<QuizResult>, StorageError> {
        let lesson = id_i64("lesson_id", lesson_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT id, user_id, lesson_id, score, total_questions, taken_at
                FROM quiz_results
                WHERE lesson_id = ?1
                ORDER BY taken_at DESC, id DESC
            ",
        )
        .bind(lesson)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }

    async fn details_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<QuizResultDetail>, StorageError> {
        let question = id_i64("question_id", question_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT result_id, question_id, choice_id, is_correct
                FROM quiz_result_details
                WHERE question_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(question)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_detail_row(&row)?);
        }
        Ok(out)
    }

    async fn count_for_user(&self, user_id: UserId) -> Result<u32, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_results WHERE user_id = ?1")
            .bind(user)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        u32_from_i64("result count", count)
    }

    async fn attempt_history(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<QuizAttemptEvent>, StorageError> {
        let mut sql = String::from(ATTEMPT_EVENT_SELECT);

        let mut bind_index = 2;
        if course_id.is_some() {
            sql.push_str(" AND c.id = ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        if from.is_some() {
            sql.push_str(" AND r.taken_at >= ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        if until.is_some() {
            sql.push_str(" AND r.taken_at < ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        sql.push_str(" ORDER BY r.taken_at DESC, r.id DESC");
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
            out.push(map_attempt_event_row(&row)?);
        }
        Ok(out)
    }

    async fn attempts_with_context(
        &self,
        user_id: UserId,
    ) -> Result<Vec<QuizAttemptEvent>, StorageError> {
        let mut sql = String::from(ATTEMPT_EVENT_SELECT);
        sql.push_str(" ORDER BY r.taken_at DESC, r.id DESC");

        let rows = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_event_row(&row)?);
        }
        Ok(out)
    }
}
