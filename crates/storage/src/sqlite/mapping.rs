use elearn_core::model::{
    ChoiceId, Course, CourseId, Enrollment, Lesson, LessonId, LessonProgress, QuestionId,
    QuizResult, QuizResultDetail, ResultId, UserId, UserProfile,
};
use sqlx::Row;

use crate::repository::{CompletionEvent, QuizAttemptEvent, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn choice_id_from_i64(v: i64) -> Result<ChoiceId, StorageError> {
    Ok(ChoiceId::new(i64_to_u64("choice_id", v)?))
}

pub(crate) fn result_id_from_i64(v: i64) -> Result<ResultId, StorageError> {
    Ok(ResultId::new(i64_to_u64("result_id", v)?))
}

pub(crate) fn map_course_row(row: &sqlx::sqlite::SqliteRow) -> Result<Course, StorageError> {
    Course::new(
        course_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        row.try_get::<Option<String>, _>("category").map_err(ser)?,
        row.try_get::<Option<String>, _>("level").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &sqlx::sqlite::SqliteRow) -> Result<Lesson, StorageError> {
    Lesson::new(
        lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("content").map_err(ser)?,
        row.try_get::<i32, _>("sort_order").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_enrollment_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Enrollment, StorageError> {
    Ok(Enrollment::new(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        row.try_get("enrolled_at").map_err(ser)?,
    ))
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<LessonProgress, StorageError> {
    Ok(LessonProgress::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        row.try_get("is_completed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    ))
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResult, StorageError> {
    Ok(QuizResult::new(
        result_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        row.try_get("taken_at").map_err(ser)?,
    ))
}

pub(crate) fn map_detail_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuizResultDetail, StorageError> {
    Ok(QuizResultDetail::new(
        result_id_from_i64(row.try_get::<i64, _>("result_id").map_err(ser)?)?,
        question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        choice_id_from_i64(row.try_get::<i64, _>("choice_id").map_err(ser)?)?,
        row.try_get("is_correct").map_err(ser)?,
    ))
}

pub(crate) fn map_profile_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, StorageError> {
    let weekly_goal = row
        .try_get::<Option<i64>, _>("weekly_goal_lessons")
        .map_err(ser)?
        .map(|v| u32_from_i64("weekly_goal_lessons", v))
        .transpose()?;

    Ok(UserProfile::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        row.try_get::<Option<String>, _>("display_name").map_err(ser)?,
        row.try_get::<Option<String>, _>("avatar_filename")
            .map_err(ser)?,
        weekly_goal,
    ))
}

/// Maps a progress row joined with lesson and course titles.
pub(crate) fn map_completion_event_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CompletionEvent, StorageError> {
    Ok(CompletionEvent {
        lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        lesson_title: row.try_get("lesson_title").map_err(ser)?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        course_title: row.try_get("course_title").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

/// Maps a result row joined with lesson and course context.
pub(crate) fn map_attempt_event_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuizAttemptEvent, StorageError> {
    Ok(QuizAttemptEvent {
        result: map_result_row(row)?,
        lesson_title: row.try_get("lesson_title").map_err(ser)?,
        lesson_sort_order: row.try_get::<i32, _>("lesson_sort_order").map_err(ser)?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        course_title: row.try_get("course_title").map_err(ser)?,
    })
}
