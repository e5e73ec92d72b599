use std::sync::Arc;

use elearn_core::model::{Actor, Course, Lesson, LessonId, LessonProgress, QuizResult};
use elearn_core::time::Clock;
use storage::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, ProgressRepository, QuizRepository,
    ResultRepository,
};

use crate::access::ensure_course_access;
use crate::error::LessonServiceError;

/// Everything the lesson page needs in one read.
#[derive(Debug, Clone)]
pub struct LessonView {
    pub lesson: Lesson,
    pub course: Course,
    pub is_completed: bool,
    pub next_lesson: Option<Lesson>,
    pub quiz_count: u32,
    pub latest_result: Option<QuizResult>,
}

/// Lesson reads and the lesson-completion write.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn ResultRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            enrollments,
            progress,
            quizzes,
            results,
        }
    }

    /// Mark a lesson completed for the acting user.
    ///
    /// Idempotent: one progress row per (user, lesson); re-completing
    /// refreshes `completed_at`. The lookup-then-write pattern relies on the
    /// store serializing writes per row.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::LessonNotFound` for an unknown lesson,
    /// `AccessError::NotEnrolled` when a non-admin is not enrolled, and
    /// storage errors unchanged.
    pub async fn complete_lesson(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
    ) -> Result<LessonProgress, LessonServiceError> {
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(LessonServiceError::LessonNotFound)?;
        ensure_course_access(actor, lesson.course_id(), self.enrollments.as_ref()).await?;

        let now = self.clock.now();
        let progress = match self.progress.get_progress(actor.id(), lesson_id).await? {
            Some(mut existing) => {
                existing.mark_completed(now);
                existing
            }
            None => LessonProgress::completed(actor.id(), lesson_id, now),
        };
        self.progress.upsert_progress(&progress).await?;
        tracing::info!(user = %actor.id(), lesson = %lesson_id, "lesson completed");
        Ok(progress)
    }

    /// Assemble the lesson detail view for the acting user.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::LessonNotFound` for an unknown lesson or
    /// a dangling course reference, `AccessError::NotEnrolled` when a
    /// non-admin is not enrolled, and storage errors unchanged.
    pub async fn lesson_view(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
    ) -> Result<LessonView, LessonServiceError> {
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(LessonServiceError::LessonNotFound)?;
        let course = self
            .courses
            .get_course(lesson.course_id())
            .await?
            .ok_or(LessonServiceError::LessonNotFound)?;
        ensure_course_access(actor, course.id(), self.enrollments.as_ref()).await?;

        let is_completed = self
            .progress
            .get_progress(actor.id(), lesson_id)
            .await?
            .is_some_and(|p| p.is_completed());

        let next_lesson = self
            .lessons
            .lessons_for_course(course.id())
            .await?
            .into_iter()
            .find(|l| l.order_key() > lesson.order_key());

        let quiz_count = self.quizzes.count_for_lesson(lesson_id).await?;
        let latest_result = self.results.latest_for_lesson(actor.id(), lesson_id).await?;

        Ok(LessonView {
            lesson,
            course,
            is_completed,
            next_lesson,
            quiz_count,
            latest_result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use elearn_core::model::{CourseId, Enrollment, UserId};
    use elearn_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn build_service(repo: &InMemoryRepository, clock: Clock) -> LessonService {
        LessonService::new(
            clock,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn seed_course(repo: &InMemoryRepository) -> (CourseId, Vec<LessonId>) {
        let course = Course::new(CourseId::new(1), "Course", None, None, None, fixed_now()).unwrap();
        repo.upsert_course(&course).await.unwrap();
        let mut lesson_ids = Vec::new();
        for i in 1..=2u64 {
            let lesson = Lesson::new(
                LessonId::new(i),
                course.id(),
                format!("Lesson {i}"),
                None,
                i as i32,
            )
            .unwrap();
            repo.upsert_lesson(&lesson).await.unwrap();
            lesson_ids.push(lesson.id());
        }
        (course.id(), lesson_ids)
    }

    #[tokio::test]
    async fn complete_lesson_twice_keeps_one_row_with_latest_timestamp() {
        let repo = InMemoryRepository::new();
        let (course_id, lessons) = seed_course(&repo).await;
        let user = UserId::new(1);
        repo.insert_enrollment(&Enrollment::new(user, course_id, fixed_now()))
            .await
            .unwrap();

        let actor = Actor::student(user);
        let service = build_service(&repo, fixed_clock());
        service.complete_lesson(&actor, lessons[0]).await.unwrap();

        let later = fixed_now() + Duration::hours(5);
        let service = build_service(&repo, Clock::fixed(later));
        let progress = service.complete_lesson(&actor, lessons[0]).await.unwrap();

        assert_eq!(progress.completed_at(), Some(later));
        assert_eq!(repo.count_completed(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unenrolled_student_cannot_complete_but_admin_can() {
        let repo = InMemoryRepository::new();
        let (_, lessons) = seed_course(&repo).await;
        let service = build_service(&repo, fixed_clock());

        let err = service
            .complete_lesson(&Actor::student(UserId::new(1)), lessons[0])
            .await
            .unwrap_err();
        assert!(matches!(err, LessonServiceError::Access(_)));

        let progress = service
            .complete_lesson(&Actor::admin(UserId::new(2)), lessons[0])
            .await
            .unwrap();
        assert!(progress.is_completed());
    }

    #[tokio::test]
    async fn lesson_view_reports_completion_and_next_lesson() {
        let repo = InMemoryRepository::new();
        let (course_id, lessons) = seed_course(&repo).await;
        let user = UserId::new(1);
        repo.insert_enrollment(&Enrollment::new(user, course_id, fixed_now()))
            .await
            .unwrap();

        let actor = Actor::student(user);
        let service = build_service(&repo, fixed_clock());
        service.complete_lesson(&actor, lessons[0]).await.unwrap();

        let view = service.lesson_view(&actor, lessons[0]).await.unwrap();
        assert!(view.is_completed);
        assert_eq!(view.next_lesson.as_ref().map(Lesson::id), Some(lessons[1]));
        assert_eq!(view.quiz_count, 0);
        assert!(view.latest_result.is_none());

        let view = service.lesson_view(&actor, lessons[1]).await.unwrap();
        assert!(!view.is_completed);
        assert!(view.next_lesson.is_none());
    }

    #[tokio::test]
    async fn unknown_lesson_is_a_distinct_error() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo, fixed_clock());
        let err = service
            .complete_lesson(&Actor::admin(UserId::new(1)), LessonId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, LessonServiceError::LessonNotFound));
    }
}
