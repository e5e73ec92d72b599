use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,
}

/// One lesson within a course.
///
/// Lessons are totally ordered within their course by `(sort_order, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    id: LessonId,
    course_id: CourseId,
    title: String,
    content: Option<String>,
    sort_order: i32,
}

impl Lesson {
    /// Creates a new lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: LessonId,
        course_id: CourseId,
        title: impl Into<String>,
        content: Option<String>,
        sort_order: i32,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        Ok(Self {
            id,
            course_id,
            title: title.trim().to_owned(),
            content: content.filter(|c| !c.is_empty()),
            sort_order,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    /// Ordering key within a course: `sort_order`, ties broken by id.
    #[must_use]
    pub fn order_key(&self) -> (i32, u64) {
        (self.sort_order, self.id.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_title() {
        let err = Lesson::new(LessonId::new(1), CourseId::new(1), "", None, 1).unwrap_err();
        assert_eq!(err, LessonError::EmptyTitle);
    }

    #[test]
    fn order_key_breaks_ties_by_id() {
        let a = Lesson::new(LessonId::new(1), CourseId::new(1), "A", None, 2).unwrap();
        let b = Lesson::new(LessonId::new(2), CourseId::new(1), "B", None, 2).unwrap();
        assert!(a.order_key() < b.order_key());
    }
}
