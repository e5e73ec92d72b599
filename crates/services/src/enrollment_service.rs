use std::sync::Arc;

use elearn_core::model::{Course, CourseId, Enrollment, UserId};
use elearn_core::time::Clock;
use storage::repository::{CourseRepository, EnrollmentRepository};

use crate::error::EnrollmentServiceError;

/// Outcome of an enrollment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled(Enrollment),
    /// The user was already enrolled; the existing row is returned untouched.
    AlreadyEnrolled(Enrollment),
}

/// Registers users into courses and lists what they are enrolled in.
#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
        }
    }

    /// Enroll a user into a course; enrolling twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::CourseNotFound` for an unknown
    /// course, and storage errors unchanged.
    pub async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<EnrollOutcome, EnrollmentServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(EnrollmentServiceError::CourseNotFound)?;

        if let Some(existing) = self.enrollments.get_enrollment(user_id, course_id).await? {
            return Ok(EnrollOutcome::AlreadyEnrolled(existing));
        }

        let enrollment = Enrollment::new(user_id, course_id, self.clock.now());
        self.enrollments.insert_enrollment(&enrollment).await?;
        tracing::info!(user = %user_id, course = %course.id(), "user enrolled");
        Ok(EnrollOutcome::Enrolled(enrollment))
    }

    /// The courses a user is enrolled in, in enrollment order.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged.
    pub async fn enrolled_courses(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Course>, EnrollmentServiceError> {
        let enrollments = self.enrollments.enrollments_for_user(user_id).await?;
        let mut courses = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            if let Some(course) = self.courses.get_course(enrollment.course_id()).await? {
                courses.push(course);
            }
        }
        Ok(courses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elearn_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn build_course(id: u64) -> Course {
        Course::new(
            CourseId::new(id),
            format!("Course {id}"),
            None,
            None,
            None,
            fixed_now(),
        )
        .unwrap()
    }

    fn service(repo: &InMemoryRepository) -> EnrollmentService {
        EnrollmentService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn enroll_creates_one_row_and_reports_duplicates() {
        let repo = InMemoryRepository::new();
        repo.upsert_course(&build_course(1)).await.unwrap();
        let service = service(&repo);
        let user = UserId::new(1);

        let first = service.enroll(user, CourseId::new(1)).await.unwrap();
        assert!(matches!(first, EnrollOutcome::Enrolled(_)));

        let second = service.enroll(user, CourseId::new(1)).await.unwrap();
        let EnrollOutcome::AlreadyEnrolled(existing) = second else {
            panic!("expected AlreadyEnrolled");
        };
        assert_eq!(existing.enrolled_at(), fixed_now());
    }

    #[tokio::test]
    async fn enroll_rejects_unknown_course() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);

        let err = service
            .enroll(UserId::new(1), CourseId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollmentServiceError::CourseNotFound));
    }

    #[tokio::test]
    async fn enrolled_courses_lists_in_enrollment_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_course(&build_course(1)).await.unwrap();
        repo.upsert_course(&build_course(2)).await.unwrap();
        let service = service(&repo);
        let user = UserId::new(1);

        service.enroll(user, CourseId::new(2)).await.unwrap();
        service.enroll(user, CourseId::new(1)).await.unwrap();

        let courses = service.enrolled_courses(user).await.unwrap();
        assert_eq!(courses.len(), 2);
    }
}
