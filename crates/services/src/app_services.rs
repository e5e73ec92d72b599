use std::sync::Arc;

use elearn_core::time::Clock;
use storage::repository::Storage;

use crate::analytics_service::AnalyticsService;
use crate::enrollment_service::EnrollmentService;
use crate::history_service::HistoryService;
use crate::lesson_service::LessonService;
use crate::profile_service::ProfileService;
use crate::progress_tracker::ProgressTracker;
use crate::quiz_authoring::QuizAuthoringService;
use crate::quiz_service::QuizService;

/// Every service wired over one `Storage` and one `Clock`.
///
/// Binary glue and integration tests build this once and hand out the
/// pieces; the services themselves stay independently constructible.
#[derive(Clone)]
pub struct AppServices {
    pub enrollment: EnrollmentService,
    pub lessons: LessonService,
    pub tracker: ProgressTracker,
    pub quiz: QuizService,
    pub authoring: QuizAuthoringService,
    pub analytics: AnalyticsService,
    pub history: HistoryService,
    pub profile: ProfileService,
}

impl AppServices {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        let tracker = ProgressTracker::new(
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.progress),
        );

        Self {
            enrollment: EnrollmentService::new(
                clock,
                Arc::clone(&storage.courses),
                Arc::clone(&storage.enrollments),
            ),
            lessons: LessonService::new(
                clock,
                Arc::clone(&storage.courses),
                Arc::clone(&storage.lessons),
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.progress),
                Arc::clone(&storage.quizzes),
                Arc::clone(&storage.results),
            ),
            quiz: QuizService::new(
                clock,
                Arc::clone(&storage.lessons),
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.quizzes),
                Arc::clone(&storage.results),
            ),
            authoring: QuizAuthoringService::new(
                Arc::clone(&storage.lessons),
                Arc::clone(&storage.quizzes),
            ),
            analytics: AnalyticsService::new(
                clock,
                tracker.clone(),
                Arc::clone(&storage.courses),
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.progress),
                Arc::clone(&storage.results),
                Arc::clone(&storage.profiles),
            ),
            history: HistoryService::new(
                Arc::clone(&storage.progress),
                Arc::clone(&storage.results),
            ),
            profile: ProfileService::new(Arc::clone(&storage.profiles)),
            tracker,
        }
    }
}
