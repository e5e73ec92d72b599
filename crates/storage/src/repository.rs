use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use elearn_core::model::{
    ChoiceId, Course, CourseId, Enrollment, Lesson, LessonId, LessonProgress, QuestionContent,
    QuestionId, QuizChoice, QuizQuestion, QuizResult, QuizResultDetail, ResultId, UserId,
    UserProfile,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── EVENT SHAPES ──────────────────────────────────────────────────────────────
//

/// A completed-lesson event joined with its lesson/course context, as
/// returned by history queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub lesson_id: LessonId,
    pub lesson_title: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub completed_at: DateTime<Utc>,
}

/// A quiz attempt joined with its lesson/course context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttemptEvent {
    pub result: QuizResult,
    pub lesson_title: String,
    pub lesson_sort_order: i32,
    pub course_id: CourseId,
    pub course_title: String,
}

/// One answered question within an attempt to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub choice_id: ChoiceId,
    pub is_correct: bool,
}

/// A fully graded quiz attempt, written in one unit of work.
///
/// `total_questions` counts questions presented; `answers` carries only the
/// answered ones. The repository assigns the result id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttemptRecord {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub score: u32,
    pub total_questions: u32,
    pub taken_at: DateTime<Utc>,
    pub answers: Vec<AnswerRecord>,
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or update a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; a missing course is `None`.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// List courses, newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Persist or update a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch a lesson by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; a missing lesson is `None`.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// All lessons under a course, ordered by `(sort_order, id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError>;

    /// Count of lessons under a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn count_for_course(&self, course_id: CourseId) -> Result<u32, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Insert an enrollment; a no-op if the (user, course) pair already
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// Fetch the enrollment for a (user, course) pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// All enrollments for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn enrollments_for_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the progress row for a (user, lesson) pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// Insert or update the single progress row for the pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError>;

    /// Count of distinct completed lessons under a course for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn completed_count_for_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u32, StorageError>;

    /// All-time count of completed lessons for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn count_completed(&self, user_id: UserId) -> Result<u32, StorageError>;

    /// Completed rows for a user with `completed_at >= from`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn completed_since(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> Result<Vec<LessonProgress>, StorageError>;

    /// All progress rows for a user restricted to one course's lessons.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn progress_for_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError>;

    /// Completed-lesson events with course/date filters, newest first,
    /// capped at `limit`. `until` is exclusive.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn completion_history(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<CompletionEvent>, StorageError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Insert a question with its choices; the store assigns all ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn insert_question(
        &self,
        lesson_id: LessonId,
        content: &QuestionContent,
    ) -> Result<QuizQuestion, StorageError>;

    /// Replace a question's fields and choices. Choices get fresh ids; the
    /// historical answer trail keeps its snapshots.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn update_question(
        &self,
        id: QuestionId,
        content: &QuestionContent,
    ) -> Result<QuizQuestion, StorageError>;

    /// Fetch a question with its choices.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_question(&self, id: QuestionId) -> Result<Option<QuizQuestion>, StorageError>;

    /// All questions for a lesson, ordered by `(sort_order, id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn questions_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<QuizQuestion>, StorageError>;

    /// Delete a question, its choices, and its answer trail.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;

    /// Count of questions under a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn count_for_lesson(&self, lesson_id: LessonId) -> Result<u32, StorageError>;
}

#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Record one graded attempt atomically: result shell first (score 0),
    /// then one detail row per answered question, then the finalized score.
    /// Either every row lands or none do.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn record_attempt(&self, attempt: &QuizAttemptRecord) -> Result<ResultId, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_result(&self, id: ResultId) -> Result<Option<QuizResult>, StorageError>;

    /// The answer trail for one result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn details_for_result(
        &self,
        id: ResultId,
    ) -> Result<Vec<QuizResultDetail>, StorageError>;

    /// All of a user's results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, StorageError>;

    /// The most recent result for a (user, lesson) pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn latest_for_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<QuizResult>, StorageError>;

    /// Every result for a lesson across users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn results_for_lesson(&self, lesson_id: LessonId)
    -> Result<Vec<QuizResult>, StorageError>;

    /// Every recorded answer for one question across attempts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn details_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<QuizResultDetail>, StorageError>;

    /// All-time count of a user's attempts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn count_for_user(&self, user_id: UserId) -> Result<u32, StorageError>;

    /// Quiz attempts with course/date filters, newest first, capped at
    /// `limit`. `until` is exclusive.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn attempt_history(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<QuizAttemptEvent>, StorageError>;

    /// All of a user's attempts with lesson/course context, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn attempts_with_context(
        &self,
        user_id: UserId,
    ) -> Result<Vec<QuizAttemptEvent>, StorageError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StorageError>;

    /// Persist or update a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

#[derive(Default)]
struct State {
    courses: HashMap<CourseId, Course>,
    lessons: HashMap<LessonId, Lesson>,
    enrollments: HashMap<(UserId, CourseId), Enrollment>,
    progress: HashMap<(UserId, LessonId), LessonProgress>,
    questions: HashMap<QuestionId, QuizQuestion>,
    results: HashMap<ResultId, QuizResult>,
    details: Vec<QuizResultDetail>,
    profiles: HashMap<UserId, UserProfile>,
    next_question_id: u64,
    next_choice_id: u64,
    next_result_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// One mutex guards the whole store, which keeps the multi-row attempt write
/// trivially atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn build_question(
    state: &mut State,
    id: QuestionId,
    lesson_id: LessonId,
    content: &QuestionContent,
) -> Result<QuizQuestion, StorageError> {
    let mut choices = Vec::with_capacity(content.choices.len());
    for choice in &content.choices {
        state.next_choice_id += 1;
        choices.push(QuizChoice::new(
            ChoiceId::new(state.next_choice_id),
            id,
            choice.text.clone(),
            choice.is_correct,
        ));
    }

    QuizQuestion::from_parts(
        id,
        lesson_id,
        content.text.clone(),
        content.explanation.clone(),
        content.sort_order,
        choices,
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

fn completion_event(state: &State, progress: &LessonProgress) -> Option<CompletionEvent> {
    let lesson = state.lessons.get(&progress.lesson_id())?;
    let course = state.courses.get(&lesson.course_id())?;
    Some(CompletionEvent {
        lesson_id: lesson.id(),
        lesson_title: lesson.title().to_owned(),
        course_id: course.id(),
        course_title: course.title().to_owned(),
        completed_at: progress.completed_at()?,
    })
}

fn attempt_event(state: &State, result: &QuizResult) -> Option<QuizAttemptEvent> {
    let lesson = state.lessons.get(&result.lesson_id())?;
    let course = state.courses.get(&lesson.course_id())?;
    Some(QuizAttemptEvent {
        result: *result,
        lesson_title: lesson.title().to_owned(),
        lesson_sort_order: lesson.sort_order(),
        course_id: course.id(),
        course_title: course.title().to_owned(),
    })
}

fn in_window(at: DateTime<Utc>, from: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|f| at >= f) && until.is_none_or(|u| at < u)
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        self.state()?.courses.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(self.state()?.courses.get(&id).cloned())
    }

    async fn list_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError> {
        let state = self.state()?;
        let mut courses: Vec<Course> = state.courses.values().cloned().collect();
        courses.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.id().value().cmp(&a.id().value()))
        });
        courses.truncate(limit as usize);
        Ok(courses)
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        self.state()?.lessons.insert(lesson.id(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        Ok(self.state()?.lessons.get(&id).cloned())
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let state = self.state()?;
        let mut lessons: Vec<Lesson> = state
            .lessons
            .values()
            .filter(|l| l.course_id() == course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(Lesson::order_key);
        Ok(lessons)
    }

    async fn count_for_course(&self, course_id: CourseId) -> Result<u32, StorageError> {
        let state = self.state()?;
        let count = state
            .lessons
            .values()
            .filter(|l| l.course_id() == course_id)
            .count();
        u32::try_from(count).map_err(|_| StorageError::Serialization("lesson count overflow".into()))
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        self.state()?
            .enrollments
            .entry((enrollment.user_id(), enrollment.course_id()))
            .or_insert(*enrollment);
        Ok(())
    }

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        Ok(self.state()?.enrollments.get(&(user_id, course_id)).copied())
    }

    async fn enrollments_for_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let state = self.state()?;
        let mut enrollments: Vec<Enrollment> = state
            .enrollments
            .values()
            .filter(|e| e.user_id() == user_id)
            .copied()
            .collect();
        enrollments.sort_by_key(|e| (e.enrolled_at(), e.course_id().value()));
        Ok(enrollments)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        Ok(self.state()?.progress.get(&(user_id, lesson_id)).copied())
    }

    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        self.state()?
            .progress
            .insert((progress.user_id(), progress.lesson_id()), *progress);
        Ok(())
    }

    async fn completed_count_for_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u32, StorageError> {
        let state = self.state()?;
        let count = state
            .progress
            .values()
            .filter(|p| p.user_id() == user_id && p.is_completed())
            .filter(|p| {
                state
                    .lessons
                    .get(&p.lesson_id())
                    .is_some_and(|l| l.course_id() == course_id)
            })
            .count();
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization("progress count overflow".into()))
    }

    async fn count_completed(&self, user_id: UserId) -> Result<u32, StorageError> {
        let state = self.state()?;
        let count = state
            .progress
            .values()
            .filter(|p| p.user_id() == user_id && p.is_completed())
            .count();
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization("progress count overflow".into()))
    }

    async fn completed_since(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let state = self.state()?;
        Ok(state
            .progress
            .values()
            .filter(|p| p.user_id() == user_id && p.is_completed())
            .filter(|p| p.completed_at().is_some_and(|at| at >= from))
            .copied()
            .collect())
    }

    async fn progress_for_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let state = self.state()?;
        Ok(state
            .progress
            .values()
            .filter(|p| p.user_id() == user_id)
            .filter(|p| {
                state
                    .lessons
                    .get(&p.lesson_id())
                    .is_some_and(|l| l.course_id() == course_id)
            })
            .copied()
            .collect())
    }

    async fn completion_history(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<CompletionEvent>, StorageError> {
        let state = self.state()?;
        let mut events: Vec<CompletionEvent> = state
            .progress
            .values()
            .filter(|p| p.user_id() == user_id && p.is_completed())
            .filter_map(|p| completion_event(&state, p))
            .filter(|e| course_id.is_none_or(|c| e.course_id == c))
            .filter(|e| in_window(e.completed_at, from, until))
            .collect();
        events.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        events.truncate(limit as usize);
        Ok(events)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_question(
        &self,
        lesson_id: LessonId,
        content: &QuestionContent,
    ) -> Result<QuizQuestion, StorageError> {
        let mut state = self.state()?;
        state.next_question_id += 1;
        let id = QuestionId::new(state.next_question_id);
        let question = build_question(&mut state, id, lesson_id, content)?;
        state.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn update_question(
        &self,
        id: QuestionId,
        content: &QuestionContent,
    ) -> Result<QuizQuestion, StorageError> {
        let mut state = self.state()?;
        let lesson_id = state
            .questions
            .get(&id)
            .ok_or(StorageError::NotFound)?
            .lesson_id();
        let question = build_question(&mut state, id, lesson_id, content)?;
        state.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<QuizQuestion>, StorageError> {
        Ok(self.state()?.questions.get(&id).cloned())
    }

    async fn questions_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        let state = self.state()?;
        let mut questions: Vec<QuizQuestion> = state
            .questions
            .values()
            .filter(|q| q.lesson_id() == lesson_id)
            .cloned()
            .collect();
        questions.sort_by_key(QuizQuestion::order_key);
        Ok(questions)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut state = self.state()?;
        if state.questions.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        state.details.retain(|d| d.question_id() != id);
        Ok(())
    }

    async fn count_for_lesson(&self, lesson_id: LessonId) -> Result<u32, StorageError> {
        let state = self.state()?;
        let count = state
            .questions
            .values()
            .filter(|q| q.lesson_id() == lesson_id)
            .count();
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization("question count overflow".into()))
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn record_attempt(&self, attempt: &QuizAttemptRecord) -> Result<ResultId, StorageError> {
        let mut state = self.state()?;
        state.next_result_id += 1;
        let id = ResultId::new(state.next_result_id);

        let result = QuizResult::new(
            id,
            attempt.user_id,
            attempt.lesson_id,
            attempt.score,
            attempt.total_questions,
            attempt.taken_at,
        );
        state.results.insert(id, result);
        for answer in &attempt.answers {
            state.details.push(QuizResultDetail::new(
                id,
                answer.question_id,
                answer.choice_id,
                answer.is_correct,
            ));
        }
        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<Option<QuizResult>, StorageError> {
        Ok(self.state()?.results.get(&id).copied())
    }

    async fn details_for_result(
        &self,
        id: ResultId,
    ) -> Result<Vec<QuizResultDetail>, StorageError> {
        let state = self.state()?;
        Ok(state
            .details
            .iter()
            .filter(|d| d.result_id() == id)
            .copied()
            .collect())
    }

    async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, StorageError> {
        let state = self.state()?;
        let mut results: Vec<QuizResult> = state
            .results
            .values()
            .filter(|r| r.user_id() == user_id)
            .copied()
            .collect();
        results.sort_by(|a, b| {
            b.taken_at()
                .cmp(&a.taken_at())
                .then(b.id().value().cmp(&a.id().value()))
        });
        Ok(results)
    }

    async fn latest_for_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<QuizResult>, StorageError> {
        let results = self.results_for_user(user_id).await?;
        Ok(results.into_iter().find(|r| r.lesson_id() == lesson_id))
    }

    async fn results_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<QuizResult>, StorageError> {
        let state = self.state()?;
        let mut results: Vec<QuizResult> = state
            .results
            .values()
            .filter(|r| r.lesson_id() == lesson_id)
            .copied()
            .collect();
        results.sort_by(|a, b| {
            b.taken_at()
                .cmp(&a.taken_at())
                .then(b.id().value().cmp(&a.id().value()))
        });
        Ok(results)
    }

    async fn details_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<QuizResultDetail>, StorageError> {
        let state = self.state()?;
        Ok(state
            .details
            .iter()
            .filter(|d| d.question_id() == question_id)
            .copied()
            .collect())
    }

    async fn count_for_user(&self, user_id: UserId) -> Result<u32, StorageError> {
        let state = self.state()?;
        let count = state
            .results
            .values()
            .filter(|r| r.user_id() == user_id)
            .count();
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization("result count overflow".into()))
    }

    async fn attempt_history(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<QuizAttemptEvent>, StorageError> {
        let state = self.state()?;
        let mut events: Vec<QuizAttemptEvent> = state
            .results
            .values()
            .filter(|r| r.user_id() == user_id)
            .filter_map(|r| attempt_event(&state, r))
            .filter(|e| course_id.is_none_or(|c| e.course_id == c))
            .filter(|e| in_window(e.result.taken_at(), from, until))
            .collect();
        events.sort_by(|a, b| b.result.taken_at().cmp(&a.result.taken_at()));
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn attempts_with_context(
        &self,
        user_id: UserId,
    ) -> Result<Vec<QuizAttemptEvent>, StorageError> {
        self.attempt_history(user_id, None, None, None, u32::MAX)
            .await
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StorageError> {
        Ok(self.state()?.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.state()?
            .profiles
            .insert(profile.user_id(), profile.clone());
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            courses: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            profiles: Arc::new(repo),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
