use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use elearn_core::model::{CourseId, LessonProgress, QuizResult, UserId};
use elearn_core::time::{Clock, start_of_day, start_of_week};
use storage::repository::{
    CompletionEvent, CourseRepository, EnrollmentRepository, ProfileRepository,
    ProgressRepository, ResultRepository,
};

use crate::error::AnalyticsError;
use crate::progress_tracker::{CourseProgress, ProgressTracker};

/// Days of history consulted for streak computation.
const STREAK_WINDOW_DAYS: i64 = 60;
/// Points in the completions-per-day chart.
const HISTOGRAM_DAYS: i64 = 7;
/// Rows shown in each "recent activity" list.
const RECENT_ITEMS: usize = 5;

/// One bar of the completions-per-day chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    /// Short `MM/DD` label.
    pub label: String,
    pub completed: u32,
}

/// Everything the dashboard shows, computed fresh for one user as of the
/// service clock's "now".
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub total_courses: u32,
    pub completed_courses: u32,
    pub total_lessons_completed: u32,
    pub total_quizzes: u32,
    pub today_completed: u32,
    pub week_completed: u32,
    pub avg_quiz_score_percent: u32,
    /// Exactly seven points, oldest first; zero-activity days included.
    pub histogram: Vec<DayCount>,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub weekly_goal_lessons: Option<u32>,
    /// `None` when no goal is set (distinct from 0%); capped at 100.
    pub weekly_goal_percent: Option<u32>,
    pub course_progress: HashMap<CourseId, CourseProgress>,
    pub recent_lessons: Vec<CompletionEvent>,
    pub latest_results: Vec<QuizResult>,
}

/// Derives dashboard metrics from stored events.
///
/// Everything is recomputed per call; there is no cached derived state, so
/// concurrent writes are handled by recomputation rather than invalidation.
#[derive(Clone)]
pub struct AnalyticsService {
    clock: Clock,
    tracker: ProgressTracker,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
    results: Arc<dyn ResultRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl AnalyticsService {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: Clock,
        tracker: ProgressTracker,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
        results: Arc<dyn ResultRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            clock,
            tracker,
            courses,
            enrollments,
            progress,
            results,
            profiles,
        }
    }

    /// Compute the full dashboard for one user as of the service clock.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged.
    pub async fn dashboard(&self, user: UserId) -> Result<Dashboard, AnalyticsError> {
        let now = self.clock.now();
        let today = now.date_naive();

        let enrollments = self.enrollments.enrollments_for_user(user).await?;
        let mut courses = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            if let Some(course) = self.courses.get_course(enrollment.course_id()).await? {
                courses.push(course);
            }
        }
        let course_progress = self.tracker.course_progress(Some(user), &courses).await?;
        let completed_courses = u32::try_from(
            course_progress.values().filter(|p| p.is_completed).count(),
        )
        .unwrap_or(u32::MAX);

        let total_lessons_completed = self.progress.count_completed(user).await?;
        let results = self.results.results_for_user(user).await?;
        let total_quizzes = u32::try_from(results.len()).unwrap_or(u32::MAX);
        let avg_quiz_score_percent = average_percent(&results);

        // One window fetch covers today/week counters, the histogram, and
        // both streaks: the week start is at most six days back, well
        // within the sixty-day streak window.
        let window_start = start_of_day(today - Duration::days(STREAK_WINDOW_DAYS - 1));
        let rows = self.progress.completed_since(user, window_start).await?;

        let start_of_today = start_of_day(today);
        let week_start = start_of_week(today);
        let today_completed = count_since(&rows, start_of_today);
        let week_completed = count_since(&rows, week_start);

        let active_dates: BTreeSet<NaiveDate> = rows
            .iter()
            .filter_map(LessonProgress::completed_at)
            .map(|at| at.date_naive())
            .collect();

        let weekly_goal_lessons = self
            .profiles
            .get_profile(user)
            .await?
            .and_then(|p| p.weekly_goal_lessons());
        let weekly_goal_percent = weekly_goal_lessons
            .filter(|goal| *goal > 0)
            .map(|goal| (week_completed * 100 / goal).min(100));

        let recent_lessons = self
            .progress
            .completion_history(user, None, None, None, RECENT_ITEMS as u32)
            .await?;
        let latest_results = results.iter().take(RECENT_ITEMS).copied().collect();

        Ok(Dashboard {
            total_courses: u32::try_from(courses.len()).unwrap_or(u32::MAX),
            completed_courses,
            total_lessons_completed,
            total_quizzes,
            today_completed,
            week_completed,
            avg_quiz_score_percent,
            histogram: histogram(&rows, today),
            current_streak_days: current_streak(&active_dates, today),
            longest_streak_days: longest_streak(&active_dates),
            weekly_goal_lessons,
            weekly_goal_percent,
            course_progress,
            recent_lessons,
            latest_results,
        })
    }
}

fn count_since(rows: &[LessonProgress], from: chrono::DateTime<chrono::Utc>) -> u32 {
    u32::try_from(
        rows.iter()
            .filter(|p| p.completed_at().is_some_and(|at| at >= from))
            .count(),
    )
    .unwrap_or(u32::MAX)
}

/// Floored average percentage over all results; 0 without any questions.
fn average_percent(results: &[QuizResult]) -> u32 {
    let correct: u64 = results.iter().map(|r| u64::from(r.score())).sum();
    let total: u64 = results.iter().map(|r| u64::from(r.total_questions())).sum();
    if total == 0 {
        0
    } else {
        u32::try_from(correct * 100 / total).unwrap_or(u32::MAX)
    }
}

/// Completions per calendar day over the trailing week, oldest first.
/// Always exactly seven points; inactive days appear with a zero count.
fn histogram(rows: &[LessonProgress], today: NaiveDate) -> Vec<DayCount> {
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for row in rows {
        if let Some(at) = row.completed_at() {
            let date = at.date_naive();
            if date > today - Duration::days(HISTOGRAM_DAYS) && date <= today {
                *counts.entry(date).or_default() += 1;
            }
        }
    }

    (0..HISTOGRAM_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            DayCount {
                date,
                label: date.format("%m/%d").to_string(),
                completed: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Consecutive active days ending at `today`, walking backward.
/// Anchored at now: a day without activity today means a streak of 0,
/// regardless of yesterday.
fn current_streak(active: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while active.contains(&day) {
        streak += 1;
        let Some(previous) = day.pred_opt() else {
            break;
        };
        day = previous;
    }
    streak
}

/// Longest run of consecutive active days within the fetched window.
fn longest_streak(active: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in active {
        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }
    longest
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
