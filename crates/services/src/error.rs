//! Shared error types for the services crate.

use thiserror::Error;

use elearn_core::model::{DraftError, ProfileError, QuestionDraft};
use storage::repository::StorageError;

/// Outcome of the shared enrollment/role gate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccessError {
    #[error("user is not enrolled in this course")]
    NotEnrolled,
    #[error("admin role required")]
    AdminOnly,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentServiceError {
    #[error("course not found")]
    CourseNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error("lesson not found")]
    LessonNotFound,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("course not found")]
    CourseNotFound,
    #[error("user is not enrolled in this course")]
    NotEnrolled,
    #[error("course has no lessons")]
    NoLessons,
    #[error("course is not completed yet")]
    NotCompleted,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("lesson not found")]
    LessonNotFound,
    #[error("quiz result not found")]
    ResultNotFound,
    #[error("lesson has no quiz questions")]
    NoQuestions,
    #[error("forbidden")]
    Forbidden,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizAuthoringService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthoringError {
    /// Validation failed; the rejected draft is returned for redisplay.
    #[error("question draft rejected: {}", .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Rejected {
        draft: QuestionDraft,
        errors: Vec<DraftError>,
    },
    #[error("lesson not found")]
    LessonNotFound,
    #[error("question not found")]
    QuestionNotFound,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
