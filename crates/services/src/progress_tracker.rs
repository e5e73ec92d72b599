use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use elearn_core::model::{
    Course, CourseId, Enrollment, Lesson, LessonId, UserId, percent,
};
use storage::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, ProgressRepository,
};

use crate::error::ProgressError;

/// Derived completion state for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseProgress {
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
    pub is_completed: bool,
}

impl CourseProgress {
    fn empty() -> Self {
        Self {
            completed: 0,
            total: 0,
            percent: 0,
            is_completed: false,
        }
    }
}

/// The course page in one read: ordered lessons plus per-lesson completion.
#[derive(Debug, Clone)]
pub struct CourseDetail {
    pub course: Course,
    pub lessons: Vec<Lesson>,
    pub enrollment: Option<Enrollment>,
    /// Per-lesson completion; only populated when the user is enrolled.
    pub completed: HashMap<LessonId, bool>,
    pub course_completed: bool,
}

/// Proof of full course completion.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub course: Course,
    /// When the last lesson was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Derives per-course completion state from stored progress events.
///
/// Pure read side: nothing here writes, so every method is safe to call
/// repeatedly and recomputes from storage each time.
#[derive(Clone)]
pub struct ProgressTracker {
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            courses,
            lessons,
            enrollments,
            progress,
        }
    }

    /// Completion state for each given course.
    ///
    /// An unauthenticated caller (`user == None`) gets an empty map: no
    /// progress is computable without identity, and that is a defined
    /// no-op rather than an error.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged.
    pub async fn course_progress(
        &self,
        user: Option<UserId>,
        courses: &[Course],
    ) -> Result<HashMap<CourseId, CourseProgress>, ProgressError> {
        let mut map = HashMap::new();
        let Some(user) = user else {
            return Ok(map);
        };

        for course in courses {
            let total = self.lessons.count_for_course(course.id()).await?;
            if total == 0 {
                map.insert(course.id(), CourseProgress::empty());
                continue;
            }

            let completed = self
                .progress
                .completed_count_for_course(user, course.id())
                .await?;

            map.insert(
                course.id(),
                CourseProgress {
                    completed,
                    total,
                    percent: percent(completed, total),
                    is_completed: completed == total,
                },
            );
        }

        Ok(map)
    }

    /// The course detail view: ordered lessons with the user's completion
    /// map. A missing progress row reads as "not completed"; it never
    /// fails the request.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CourseNotFound` for an unknown course and
    /// storage errors unchanged.
    pub async fn course_detail(
        &self,
        user: UserId,
        course_id: CourseId,
    ) -> Result<CourseDetail, ProgressError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(ProgressError::CourseNotFound)?;
        let lessons = self.lessons.lessons_for_course(course_id).await?;
        let enrollment = self.enrollments.get_enrollment(user, course_id).await?;

        let mut completed = HashMap::new();
        if enrollment.is_some() {
            for progress in self.progress.progress_for_course(user, course_id).await? {
                completed.insert(progress.lesson_id(), progress.is_completed());
            }
        }

        let course_completed = !lessons.is_empty()
            && lessons
                .iter()
                .all(|l| completed.get(&l.id()).copied().unwrap_or(false));

        Ok(CourseDetail {
            course,
            lessons,
            enrollment,
            completed,
            course_completed,
        })
    }

    /// The completion certificate for a fully finished course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NotEnrolled` without an enrollment,
    /// `ProgressError::NoLessons` for an empty course,
    /// `ProgressError::NotCompleted` while lessons remain, and storage
    /// errors unchanged.
    pub async fn certificate(
        &self,
        user: UserId,
        course_id: CourseId,
    ) -> Result<Certificate, ProgressError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(ProgressError::CourseNotFound)?;

        if self.enrollments.get_enrollment(user, course_id).await?.is_none() {
            return Err(ProgressError::NotEnrolled);
        }

        let total = self.lessons.count_for_course(course_id).await?;
        if total == 0 {
            return Err(ProgressError::NoLessons);
        }

        let rows = self.progress.progress_for_course(user, course_id).await?;
        let completed = rows.iter().filter(|p| p.is_completed()).count();
        if completed < total as usize {
            return Err(ProgressError::NotCompleted);
        }

        let completed_at = rows
            .iter()
            .filter(|p| p.is_completed())
            .filter_map(|p| p.completed_at())
            .max();

        Ok(Certificate {
            course,
            completed_at,
        })
    }
}
