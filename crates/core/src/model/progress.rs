use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, UserId};

/// Completion record for one (user, lesson) pair.
///
/// Exactly one record exists per pair once the user has touched the lesson.
/// Completing an already-completed lesson refreshes `completed_at` instead of
/// creating a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    user_id: UserId,
    lesson_id: LessonId,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// A fresh, not-yet-completed record.
    #[must_use]
    pub fn new(user_id: UserId, lesson_id: LessonId) -> Self {
        Self {
            user_id,
            lesson_id,
            is_completed: false,
            completed_at: None,
        }
    }

    /// A record created directly in the completed state.
    #[must_use]
    pub fn completed(user_id: UserId, lesson_id: LessonId, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            lesson_id,
            is_completed: true,
            completed_at: Some(at),
        }
    }

    /// Rebuild a record from persisted fields without re-validation.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        lesson_id: LessonId,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            is_completed,
            completed_at,
        }
    }

    /// Mark the lesson completed as of `at`.
    ///
    /// Idempotent: re-marking refreshes the timestamp only.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
