use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, UserId};

/// A user's registration into a course.
///
/// At most one enrollment exists per (user, course) pair; it gates lesson
/// completion and quiz taking for non-admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    user_id: UserId,
    course_id: CourseId,
    enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id,
            enrolled_at,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }
}
