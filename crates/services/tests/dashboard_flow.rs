use chrono::Duration;
use elearn_core::model::{Actor, Course, CourseId, Lesson, LessonId, UserId};
use elearn_core::time::{Clock, fixed_now};
use services::{AppServices, ProfileUpdate};
use storage::repository::{CourseRepository, LessonRepository, Storage};

async fn seed_course(storage: &Storage, lesson_count: u64) -> (CourseId, Vec<LessonId>) {
    let course = Course::new(
        CourseId::new(1),
        "Rust Basics",
        None,
        None,
        None,
        fixed_now(),
    )
    .unwrap();
    storage.courses.upsert_course(&course).await.unwrap();

    let mut lessons = Vec::new();
    for i in 1..=lesson_count {
        let lesson = Lesson::new(
            LessonId::new(i),
            course.id(),
            format!("Lesson {i}"),
            None,
            i as i32,
        )
        .unwrap();
        storage.lessons.upsert_lesson(&lesson).await.unwrap();
        lessons.push(lesson.id());
    }
    (course.id(), lessons)
}

#[tokio::test]
async fn weekly_goal_attainment_is_floored_and_capped() {
    let storage = Storage::in_memory();
    // fixed_now() is a Tuesday, so today's completions count toward the
    // Monday-start week.
    let services = AppServices::new(Clock::fixed(fixed_now()), &storage);
    let (course_id, lessons) = seed_course(&storage, 7).await;

    let user = UserId::new(1);
    let student = Actor::student(user);
    services.enrollment.enroll(user, course_id).await.unwrap();
    services
        .profile
        .update(
            user,
            &ProfileUpdate {
                weekly_goal: Some("5".into()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

    for lesson in &lessons[..3] {
        services.lessons.complete_lesson(&student, *lesson).await.unwrap();
    }

    let dashboard = services.analytics.dashboard(user).await.unwrap();
    assert_eq!(dashboard.week_completed, 3);
    assert_eq!(dashboard.weekly_goal_lessons, Some(5));
    assert_eq!(dashboard.weekly_goal_percent, Some(60));

    for lesson in &lessons[3..6] {
        services.lessons.complete_lesson(&student, *lesson).await.unwrap();
    }
    let dashboard = services.analytics.dashboard(user).await.unwrap();
    assert_eq!(dashboard.week_completed, 6);
    // Overshooting the goal caps at 100, never above.
    assert_eq!(dashboard.weekly_goal_percent, Some(100));
}

#[tokio::test]
async fn dashboard_without_goal_or_quizzes_uses_defined_defaults() {
    let storage = Storage::in_memory();
    let services = AppServices::new(Clock::fixed(fixed_now()), &storage);
    let (course_id, _) = seed_course(&storage, 2).await;

    let user = UserId::new(1);
    services.enrollment.enroll(user, course_id).await.unwrap();

    let dashboard = services.analytics.dashboard(user).await.unwrap();
    assert_eq!(dashboard.total_courses, 1);
    assert_eq!(dashboard.completed_courses, 0);
    assert_eq!(dashboard.avg_quiz_score_percent, 0);
    assert_eq!(dashboard.weekly_goal_percent, None);
    assert_eq!(dashboard.histogram.len(), 7);
    assert!(dashboard.histogram.iter().all(|d| d.completed == 0));
    assert_eq!(dashboard.current_streak_days, 0);
    assert_eq!(dashboard.longest_streak_days, 0);
}

#[tokio::test]
async fn streaks_follow_completion_dates() {
    let storage = Storage::in_memory();
    let (course_id, lessons) = seed_course(&storage, 5).await;
    let user = UserId::new(1);
    let student = Actor::student(user);

    // Complete lessons on three consecutive days, then skip two days and
    // complete another, finishing "today".
    let days_and_lessons = [(4, 0), (3, 1), (2, 2), (0, 3)];
    for (days_ago, lesson_index) in days_and_lessons {
        let at = fixed_now() - Duration::days(days_ago);
        let services = AppServices::new(Clock::fixed(at), &storage);
        if days_ago == 4 {
            services.enrollment.enroll(user, course_id).await.unwrap();
        }
        services
            .lessons
            .complete_lesson(&student, lessons[lesson_index])
            .await
            .unwrap();
    }

    let services = AppServices::new(Clock::fixed(fixed_now()), &storage);
    let dashboard = services.analytics.dashboard(user).await.unwrap();

    assert_eq!(dashboard.today_completed, 1);
    assert_eq!(dashboard.current_streak_days, 1);
    assert_eq!(dashboard.longest_streak_days, 3);

    let total_in_chart: u32 = dashboard.histogram.iter().map(|d| d.completed).sum();
    assert_eq!(total_in_chart, 4);

    // Viewed a day later with no new activity, the current streak resets
    // to zero even though yesterday was active.
    let tomorrow = AppServices::new(Clock::fixed(fixed_now() + Duration::days(1)), &storage);
    let dashboard = tomorrow.analytics.dashboard(user).await.unwrap();
    assert_eq!(dashboard.current_streak_days, 0);
    assert_eq!(dashboard.longest_streak_days, 3);
}
