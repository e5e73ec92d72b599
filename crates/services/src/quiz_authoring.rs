use std::sync::Arc;

use elearn_core::model::{Actor, LessonId, QuestionDraft, QuestionId, QuizQuestion};
use storage::repository::{LessonRepository, QuizRepository};

use crate::access::ensure_author;
use crate::error::AuthoringError;

/// Admin-only question authoring: create, edit, delete, list.
///
/// Drafts are validated exhaustively; a rejection carries the draft back to
/// the caller for redisplay alongside the full error list.
#[derive(Clone)]
pub struct QuizAuthoringService {
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizAuthoringService {
    #[must_use]
    pub fn new(lessons: Arc<dyn LessonRepository>, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { lessons, quizzes }
    }

    /// Create a question under a lesson from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::AdminOnly` for non-admins,
    /// `AuthoringError::LessonNotFound` for an unknown lesson,
    /// `AuthoringError::Rejected` with the draft and every validation
    /// message, and storage errors unchanged.
    pub async fn create_question(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
        draft: &QuestionDraft,
    ) -> Result<QuizQuestion, AuthoringError> {
        ensure_author(actor)?;
        self.lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(AuthoringError::LessonNotFound)?;

        let content = draft.validate().map_err(|errors| AuthoringError::Rejected {
            draft: draft.clone(),
            errors,
        })?;

        let question = self.quizzes.insert_question(lesson_id, &content).await?;
        tracing::info!(lesson = %lesson_id, question = %question.id(), "quiz question created");
        Ok(question)
    }

    /// Replace a question's text and choices from a validated draft.
    ///
    /// The old choices are discarded and fresh ones stored; the historical
    /// answer trail keeps its correctness snapshots.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::AdminOnly` for non-admins,
    /// `AuthoringError::QuestionNotFound` for an unknown question,
    /// `AuthoringError::Rejected` on validation failure, and storage errors
    /// unchanged.
    pub async fn update_question(
        &self,
        actor: &Actor,
        question_id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<QuizQuestion, AuthoringError> {
        ensure_author(actor)?;

        let content = draft.validate().map_err(|errors| AuthoringError::Rejected {
            draft: draft.clone(),
            errors,
        })?;

        let question = self
            .quizzes
            .update_question(question_id, &content)
            .await
            .map_err(|err| match err {
                storage::repository::StorageError::NotFound => AuthoringError::QuestionNotFound,
                other => AuthoringError::Storage(other),
            })?;
        tracing::info!(question = %question_id, "quiz question updated");
        Ok(question)
    }

    /// Delete a question along with its choices and answer trail.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::AdminOnly` for non-admins,
    /// `AuthoringError::QuestionNotFound` for an unknown question, and
    /// storage errors unchanged.
    pub async fn delete_question(
        &self,
        actor: &Actor,
        question_id: QuestionId,
    ) -> Result<(), AuthoringError> {
        ensure_author(actor)?;

        self.quizzes
            .delete_question(question_id)
            .await
            .map_err(|err| match err {
                storage::repository::StorageError::NotFound => AuthoringError::QuestionNotFound,
                other => AuthoringError::Storage(other),
            })?;
        tracing::info!(question = %question_id, "quiz question deleted");
        Ok(())
    }

    /// The manage view: a lesson's questions in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::AdminOnly` for non-admins and storage errors
    /// unchanged.
    pub async fn list_questions(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
    ) -> Result<Vec<QuizQuestion>, AuthoringError> {
        ensure_author(actor)?;
        Ok(self.quizzes.questions_for_lesson(lesson_id).await?)
    }
}
