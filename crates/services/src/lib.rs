#![forbid(unsafe_code)]

pub mod access;
pub mod analytics_service;
pub mod app_services;
pub mod enrollment_service;
pub mod error;
pub mod history_service;
pub mod lesson_service;
pub mod profile_service;
pub mod progress_tracker;
pub mod quiz_authoring;
pub mod quiz_service;

pub use elearn_core::Clock;

pub use analytics_service::{AnalyticsService, Dashboard, DayCount};
pub use app_services::AppServices;
pub use enrollment_service::{EnrollOutcome, EnrollmentService};
pub use error::{
    AccessError, AnalyticsError, AuthoringError, EnrollmentServiceError, HistoryError,
    LessonServiceError, ProfileServiceError, ProgressError, QuizServiceError,
};
pub use history_service::{HISTORY_PAGE_SIZE, History, HistoryFilter, HistoryService};
pub use lesson_service::{LessonService, LessonView};
pub use profile_service::{ProfileService, ProfileUpdate};
pub use progress_tracker::{Certificate, CourseDetail, CourseProgress, ProgressTracker};
pub use quiz_authoring::QuizAuthoringService;
pub use quiz_service::{
    GradedAttempt, LessonQuizSummary, LessonResults, QuestionStats, QuizService, ResultReview,
    RetryItem, RetryPrompt, RetryReview,
};
