mod actor;
mod course;
mod enrollment;
mod ids;
mod lesson;
mod profile;
mod progress;
mod quiz;
mod result;

pub use actor::{Actor, Role};
pub use course::{Course, CourseError};
pub use enrollment::Enrollment;
pub use ids::{ChoiceId, CourseId, LessonId, QuestionId, ResultId, UserId};
pub use lesson::{Lesson, LessonError};
pub use profile::{ProfileError, UserProfile, parse_weekly_goal};
pub use progress::LessonProgress;
pub use quiz::{
    CHOICE_SLOTS, ChoiceContent, DraftError, QuestionContent, QuestionDraft, QuizChoice,
    QuizError, QuizQuestion,
};
pub use result::{QuizResult, QuizResultDetail, percent};
