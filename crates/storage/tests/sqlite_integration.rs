use chrono::Duration;
use elearn_core::model::{
    ChoiceContent, Course, CourseId, Enrollment, Lesson, LessonId, LessonProgress,
    QuestionContent, UserId,
};
use elearn_core::time::fixed_now;
use storage::repository::{
    AnswerRecord, CourseRepository, EnrollmentRepository, LessonRepository, ProfileRepository,
    ProgressRepository, QuizAttemptRecord, QuizRepository, ResultRepository,
};
use storage::sqlite::SqliteRepository;

fn build_course(id: u64) -> Course {
    Course::new(
        CourseId::new(id),
        format!("Course {id}"),
        Some("intro".into()),
        Some("programming".into()),
        Some("beginner".into()),
        fixed_now(),
    )
    .unwrap()
}

fn build_lesson(id: u64, course_id: CourseId, sort_order: i32) -> Lesson {
    Lesson::new(
        LessonId::new(id),
        course_id,
        format!("Lesson {id}"),
        Some("body".into()),
        sort_order,
    )
    .unwrap()
}

fn question_content(correct: usize) -> QuestionContent {
    QuestionContent {
        text: "What is 2+2?".into(),
        explanation: Some("arithmetic".into()),
        sort_order: 1,
        choices: (1..=3)
            .map(|i| ChoiceContent {
                text: format!("choice {i}"),
                is_correct: i == correct,
            })
            .collect(),
    }
}

#[tokio::test]
async fn sqlite_roundtrips_courses_lessons_and_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = build_course(1);
    repo.upsert_course(&course).await.unwrap();
    let lesson = build_lesson(1, course.id(), 1);
    repo.upsert_lesson(&lesson).await.unwrap();

    let fetched = repo.get_course(course.id()).await.unwrap().unwrap();
    assert_eq!(fetched, course);
    assert_eq!(repo.count_for_course(course.id()).await.unwrap(), 1);

    let user = UserId::new(7);
    repo.insert_enrollment(&Enrollment::new(user, course.id(), fixed_now()))
        .await
        .unwrap();
    // duplicate enrollment is a no-op
    repo.insert_enrollment(&Enrollment::new(
        user,
        course.id(),
        fixed_now() + Duration::days(1),
    ))
    .await
    .unwrap();
    let stored = repo
        .get_enrollment(user, course.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.enrolled_at(), fixed_now());

    repo.upsert_progress(&LessonProgress::completed(user, lesson.id(), fixed_now()))
        .await
        .unwrap();
    let later = fixed_now() + Duration::hours(2);
    repo.upsert_progress(&LessonProgress::completed(user, lesson.id(), later))
        .await
        .unwrap();

    assert_eq!(repo.count_completed(user).await.unwrap(), 1);
    let progress = repo.get_progress(user, lesson.id()).await.unwrap().unwrap();
    assert_eq!(progress.completed_at(), Some(later));
    assert_eq!(
        repo.completed_count_for_course(user, course.id())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn sqlite_records_attempts_atomically_with_details() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_attempts?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = build_course(1);
    repo.upsert_course(&course).await.unwrap();
    let lesson = build_lesson(1, course.id(), 1);
    repo.upsert_lesson(&lesson).await.unwrap();

    let question = repo
        .insert_question(lesson.id(), &question_content(2))
        .await
        .unwrap();
    assert_eq!(question.choices().len(), 3);
    let correct = question.correct_choice().unwrap();

    let user = UserId::new(1);
    let attempt = QuizAttemptRecord {
        user_id: user,
        lesson_id: lesson.id(),
        score: 1,
        total_questions: 2,
        taken_at: fixed_now(),
        answers: vec![AnswerRecord {
            question_id: question.id(),
            choice_id: correct.id(),
            is_correct: true,
        }],
    };

    let result_id = repo.record_attempt(&attempt).await.unwrap();
    let result = repo.get_result(result_id).await.unwrap().unwrap();
    assert_eq!(result.score(), 1);
    assert_eq!(result.total_questions(), 2);

    let details = repo.details_for_result(result_id).await.unwrap();
    assert_eq!(details.len(), 1);
    assert!(details[0].is_correct());

    // Editing the question replaces choices but keeps the answer trail.
    let updated = repo
        .update_question(question.id(), &question_content(1))
        .await
        .unwrap();
    assert_ne!(
        updated.choices().first().map(elearn_core::model::QuizChoice::id),
        question.choices().first().map(elearn_core::model::QuizChoice::id),
    );
    let details = repo.details_for_result(result_id).await.unwrap();
    assert_eq!(details.len(), 1);
    assert!(details[0].is_correct());

    let by_question = repo.details_for_question(question.id()).await.unwrap();
    assert_eq!(by_question.len(), 1);
}

#[tokio::test]
async fn sqlite_history_queries_filter_and_order() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_history?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = build_course(1);
    let other = build_course(2);
    repo.upsert_course(&course).await.unwrap();
    repo.upsert_course(&other).await.unwrap();

    let user = UserId::new(1);
    for i in 1..=3u64 {
        let lesson = build_lesson(i, course.id(), i as i32);
        repo.upsert_lesson(&lesson).await.unwrap();
        repo.upsert_progress(&LessonProgress::completed(
            user,
            lesson.id(),
            fixed_now() + Duration::days(i as i64),
        ))
        .await
        .unwrap();
    }
    let stray = build_lesson(9, other.id(), 1);
    repo.upsert_lesson(&stray).await.unwrap();
    repo.upsert_progress(&LessonProgress::completed(user, stray.id(), fixed_now()))
        .await
        .unwrap();

    let events = repo
        .completion_history(user, Some(course.id()), None, None, 50)
        .await
        .unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.windows(2).all(|w| w[0].completed_at >= w[1].completed_at));
    assert_eq!(events[0].course_title, "Course 1");

    let windowed = repo
        .completion_history(
            user,
            None,
            Some(fixed_now() + Duration::days(2)),
            Some(fixed_now() + Duration::days(3)),
            50,
        )
        .await
        .unwrap();
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].lesson_title, "Lesson 2");

    let question = repo
        .insert_question(LessonId::new(1), &question_content(1))
        .await
        .unwrap();
    let correct = question.correct_choice().unwrap();
    for day in 0..2i64 {
        repo.record_attempt(&QuizAttemptRecord {
            user_id: user,
            lesson_id: LessonId::new(1),
            score: 1,
            total_questions: 1,
            taken_at: fixed_now() + Duration::days(day),
            answers: vec![AnswerRecord {
                question_id: question.id(),
                choice_id: correct.id(),
                is_correct: true,
            }],
        })
        .await
        .unwrap();
    }

    let attempts = repo
        .attempt_history(user, Some(course.id()), None, None, 1)
        .await
        .unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].result.taken_at(), fixed_now() + Duration::days(1));
    assert_eq!(attempts[0].lesson_title, "Lesson 1");

    let all = repo.attempts_with_context(user).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn sqlite_profiles_upsert_and_fetch() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_profiles?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(1);
    assert!(repo.get_profile(user).await.unwrap().is_none());

    let mut profile = elearn_core::model::UserProfile::new(user);
    profile.set_display_name("Alice");
    profile.set_weekly_goal(Some(5));
    repo.upsert_profile(&profile).await.unwrap();

    let stored = repo.get_profile(user).await.unwrap().unwrap();
    assert_eq!(stored.display_name(), Some("Alice"));
    assert_eq!(stored.weekly_goal_lessons(), Some(5));

    profile.set_weekly_goal(None);
    repo.upsert_profile(&profile).await.unwrap();
    let stored = repo.get_profile(user).await.unwrap().unwrap();
    assert_eq!(stored.weekly_goal_lessons(), None);
}
