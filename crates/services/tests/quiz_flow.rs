use std::collections::HashMap;

use elearn_core::model::{
    Actor, Course, CourseId, Lesson, LessonId, QuestionDraft, UserId,
};
use elearn_core::time::{fixed_clock, fixed_now};
use services::{AppServices, EnrollOutcome, HistoryFilter, RetryPrompt};
use storage::repository::{CourseRepository, LessonRepository, Storage};

async fn seed_course(storage: &Storage) -> (CourseId, LessonId) {
    let course = Course::new(
        CourseId::new(1),
        "Rust Basics",
        Some("an introduction".into()),
        Some("programming".into()),
        Some("beginner".into()),
        fixed_now(),
    )
    .unwrap();
    storage.courses.upsert_course(&course).await.unwrap();

    let lesson = Lesson::new(LessonId::new(1), course.id(), "Ownership", None, 1).unwrap();
    storage.lessons.upsert_lesson(&lesson).await.unwrap();
    (course.id(), lesson.id())
}

fn draft(text: &str, sort_order: i32) -> QuestionDraft {
    QuestionDraft {
        question_text: text.into(),
        explanation: String::new(),
        sort_order: sort_order.to_string(),
        choices: ["yes".into(), "no".into(), "maybe".into(), String::new()],
        correct_choice: Some("1".into()),
    }
}

#[tokio::test]
async fn quiz_flow_records_one_attempt_with_answer_trail() {
    let storage = Storage::in_memory();
    let services = AppServices::new(fixed_clock(), &storage);
    let (course_id, lesson_id) = seed_course(&storage).await;

    let admin = Actor::admin(UserId::new(1));
    let student_id = UserId::new(2);
    let student = Actor::student(student_id);

    let outcome = services.enrollment.enroll(student_id, course_id).await.unwrap();
    assert!(matches!(outcome, EnrollOutcome::Enrolled(_)));

    let mut questions = Vec::new();
    for i in 1..=4 {
        let question = services
            .authoring
            .create_question(&admin, lesson_id, &draft(&format!("Q{i}?"), i))
            .await
            .unwrap();
        questions.push(question);
    }

    // Answer three correctly, leave the fourth unanswered.
    let mut answers = HashMap::new();
    for question in &questions[..3] {
        answers.insert(question.id(), question.correct_choice().unwrap().id());
    }
    let graded = services
        .quiz
        .take_quiz(&student, lesson_id, &answers)
        .await
        .unwrap();

    assert_eq!(graded.score, 3);
    assert_eq!(graded.total_questions, 4);
    assert_eq!(graded.percent, 75);

    let review = services
        .quiz
        .result_review(&student, graded.result_id)
        .await
        .unwrap();
    assert_eq!(review.details.len(), 3);
    assert_eq!(review.percent, 75);

    // Everything answered was correct, so there is nothing to retry and no
    // new result appears.
    let prompt = services
        .quiz
        .retry_incorrect(student_id, graded.result_id)
        .await
        .unwrap();
    assert!(matches!(prompt, RetryPrompt::NothingToRetry));

    let summaries = services.quiz.summary_for_user(student_id).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].attempts, 1);
    assert_eq!(summaries[0].best_score, 3);
    assert_eq!(summaries[0].best_percent, 75);
    assert_eq!(summaries[0].lesson_title, "Ownership");
    assert_eq!(summaries[0].course_title, "Rust Basics");
}

#[tokio::test]
async fn lesson_completion_and_history_flow() {
    let storage = Storage::in_memory();
    let services = AppServices::new(fixed_clock(), &storage);
    let (course_id, lesson_id) = seed_course(&storage).await;

    let student_id = UserId::new(2);
    let student = Actor::student(student_id);
    services.enrollment.enroll(student_id, course_id).await.unwrap();

    services.lessons.complete_lesson(&student, lesson_id).await.unwrap();
    // Completing again refreshes rather than duplicating.
    services.lessons.complete_lesson(&student, lesson_id).await.unwrap();

    let detail = services.tracker.course_detail(student_id, course_id).await.unwrap();
    assert!(detail.course_completed);

    let certificate = services
        .tracker
        .certificate(student_id, course_id)
        .await
        .unwrap();
    assert_eq!(certificate.completed_at, Some(fixed_now()));

    let history = services
        .history
        .history(student_id, &HistoryFilter::default())
        .await
        .unwrap();
    assert_eq!(history.completions.len(), 1);
    assert_eq!(history.completions[0].lesson_title, "Ownership");
    assert!(history.attempts.is_empty());

    // A filter whose bounds fail to parse behaves as unfiltered.
    let sloppy = HistoryFilter::from_raw(Some(course_id), Some("14-11-2023"), Some("garbage"));
    let history = services.history.history(student_id, &sloppy).await.unwrap();
    assert_eq!(history.completions.len(), 1);
}
