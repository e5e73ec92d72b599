use std::collections::HashMap;

use elearn_core::model::{
    LessonId, QuestionContent, QuestionId, QuizChoice, QuizQuestion,
};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{choice_id_from_i64, id_i64, lesson_id_from_i64, question_id_from_i64, ser, u32_from_i64},
};
use crate::repository::{QuizRepository, StorageError};

fn map_choice_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizChoice, StorageError> {
    Ok(QuizChoice::new(
        choice_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        row.try_get::<String, _>("choice_text").map_err(ser)?,
        row.try_get("is_correct").map_err(ser)?,
    ))
}

fn assemble_question(
    id: QuestionId,
    lesson_id: LessonId,
    content: &QuestionContent,
    choices: Vec<QuizChoice>,
) -> Result<QuizQuestion, StorageError> {
    QuizQuestion::from_parts(
        id,
        lesson_id,
        content.text.clone(),
        content.explanation.clone(),
        content.sort_order,
        choices,
    )
    .map_err(ser)
}

impl SqliteRepository {
    async fn insert_choices(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        question_id: QuestionId,
        content: &QuestionContent,
    ) -> Result<Vec<QuizChoice>, StorageError> {
        let question = id_i64("question_id", question_id.value())?;

        let mut choices = Vec::with_capacity(content.choices.len());
        for choice in &content.choices {
            let res = sqlx::query(
                r"
                    INSERT INTO quiz_choices (question_id, choice_text, is_correct)
                    VALUES (?1, ?2, ?3)
                ",
            )
            .bind(question)
            .bind(&choice.text)
            .bind(choice.is_correct)
            .execute(&mut **tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            choices.push(QuizChoice::new(
                choice_id_from_i64(res.last_insert_rowid())?,
                question_id,
                choice.text.clone(),
                choice.is_correct,
            ));
        }
        Ok(choices)
    }
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_question(
        &self,
        lesson_id: LessonId,
        content: &QuestionContent,
    ) -> Result<QuizQuestion, StorageError> {
        let lesson = id_i64("lesson_id", lesson_id.value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_questions (lesson_id, question_text, explanation, sort_order)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(lesson)
        .bind(&content.text)
        .bind(content.explanation.as_deref())
        .bind(i64::from(content.sort_order))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let question_id = question_id_from_i64(res.last_insert_rowid())?;
        let choices = Self::insert_choices(&mut tx, question_id, content).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        assemble_question(question_id, lesson_id, content, choices)
    }

    async fn update_question(
        &self,
        id: QuestionId,
        content: &QuestionContent,
    ) -> Result<QuizQuestion, StorageError> {
        let question = id_i64("question_id", id.value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let lesson: i64 = sqlx::query_scalar("SELECT lesson_id FROM quiz_questions WHERE id = ?1")
            .bind(question)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        sqlx::query(
            r"
                UPDATE quiz_questions
                SET question_text = ?2, explanation = ?3, sort_order = ?4
                WHERE id = ?1
            ",
        )
        .bind(question)
        .bind(&content.text)
        .bind(content.explanation.as_deref())
        .bind(i64::from(content.sort_order))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Replace choices wholesale; the answer trail keeps its snapshots.
        sqlx::query("DELETE FROM quiz_choices WHERE question_id = ?1")
            .bind(question)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let choices = Self::insert_choices(&mut tx, id, content).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        assemble_question(id, lesson_id_from_i64(lesson)?, content, choices)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<QuizQuestion>, StorageError> {
        let question = id_i64("question_id", id.value())?;

        let Some(row) = sqlx::query(
            r"
                SELECT id, lesson_id, question_text, explanation, sort_order
                FROM quiz_questions
                WHERE id = ?1
            ",
        )
        .bind(question)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let choice_rows = sqlx::query(
            r"
                SELECT id, question_id, choice_text, is_correct
                FROM quiz_choices
                WHERE question_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(question)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut choices = Vec::with_capacity(choice_rows.len());
        for choice_row in &choice_rows {
            choices.push(map_choice_row(choice_row)?);
        }

        let question = QuizQuestion::from_parts(
            question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
            lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
            row.try_get::<String, _>("question_text").map_err(ser)?,
            row.try_get::<Option<String>, _>("explanation").map_err(ser)?,
            row.try_get::<i32, _>("sort_order").map_err(ser)?,
            choices,
        )
        .map_err(ser)?;

        Ok(Some(question))
    }

    async fn questions_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        let lesson = id_i64("lesson_id", lesson_id.value())?;

        let question_rows = sqlx::query(
            r"
                SELECT id, lesson_id, question_text, explanation, sort_order
                FROM quiz_questions
                WHERE lesson_id = ?1
                ORDER BY sort_order ASC, id ASC
            ",
        )
        .bind(lesson)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let choice_rows = sqlx::query(
            r"
                SELECT ch.id, ch.question_id, ch.choice_text, ch.is_correct
                FROM quiz_choices ch
                JOIN quiz_questions q ON q.id = ch.question_id
                WHERE q.lesson_id = ?1
                ORDER BY ch.id ASC
            ",
        )
        .bind(lesson)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut by_question: HashMap<QuestionId, Vec<QuizChoice>> = HashMap::new();
        for choice_row in &choice_rows {
            let choice = map_choice_row(choice_row)?;
            by_question.entry(choice.question_id()).or_default().push(choice);
        }

        let mut out = Vec::with_capacity(question_rows.len());
        for row in &question_rows {
            let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
            let question = QuizQuestion::from_parts(
                id,
                lesson_id,
                row.try_get::<String, _>("question_text").map_err(ser)?,
                row.try_get::<Option<String>, _>("explanation").map_err(ser)?,
                row.try_get::<i32, _>("sort_order").map_err(ser)?,
                by_question.remove(&id).unwrap_or_default(),
            )
            .map_err(ser)?;
            out.push(question);
        }
        Ok(out)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let question = id_i64("question_id", id.value())?;

        let res = sqlx::query("DELETE FROM quiz_questions WHERE id = ?1")
            .bind(question)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn count_for_lesson(&self, lesson_id: LessonId) -> Result<u32, StorageError> {
        let lesson = id_i64("lesson_id", lesson_id.value())?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM quiz_questions WHERE lesson_id = ?1")
                .bind(lesson)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;

        u32_from_i64("question count", count)
    }
}
