use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CourseId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,
}

/// A course: an ordered collection of lessons a user can enroll in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    category: Option<String>,
    level: Option<String>,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates a new course.
    ///
    /// Title is trimmed; empty optional fields are normalized to `None`.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: Option<String>,
        category: Option<String>,
        level: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: normalize(description),
            category: normalize(category),
            level: normalize(level),
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_rejects_empty_title() {
        let err = Course::new(CourseId::new(1), "   ", None, None, None, fixed_now()).unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);
    }

    #[test]
    fn new_trims_and_normalizes_fields() {
        let course = Course::new(
            CourseId::new(1),
            "  Rust Basics  ",
            Some("   ".into()),
            Some(" programming ".into()),
            Some("beginner".into()),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(course.title(), "Rust Basics");
        assert_eq!(course.description(), None);
        assert_eq!(course.category(), Some("programming"));
        assert_eq!(course.level(), Some("beginner"));
    }
}
