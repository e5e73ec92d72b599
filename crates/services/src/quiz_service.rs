use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use elearn_core::model::{
    Actor, ChoiceId, CourseId, LessonId, QuestionId, QuizChoice, QuizQuestion, QuizResult,
    QuizResultDetail, ResultId, UserId, percent,
};
use elearn_core::time::Clock;
use storage::repository::{
    AnswerRecord, EnrollmentRepository, LessonRepository, QuizAttemptRecord, QuizRepository,
    ResultRepository,
};

use crate::access::{ensure_author, ensure_course_access};
use crate::error::QuizServiceError;

//
// ─── VIEW SHAPES ───────────────────────────────────────────────────────────────
//

/// Outcome of a graded, persisted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradedAttempt {
    pub result_id: ResultId,
    pub score: u32,
    pub total_questions: u32,
    pub percent: u32,
}

/// The retry-incorrect entry point: either there is nothing to retry
/// (full marks, a success state) or the wrong questions to re-present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPrompt {
    NothingToRetry,
    Questions(Vec<QuizQuestion>),
}

/// One reviewed answer within a scored retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryItem {
    pub question_id: QuestionId,
    pub question_text: String,
    pub explanation: Option<String>,
    /// `None` marks an unanswered question.
    pub selected_text: Option<String>,
    pub is_correct: bool,
    pub correct_text: Option<String>,
}

/// Transient tally for a retry run. Never persisted: retries are practice,
/// the original attempt stays the graded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryReview {
    pub score: u32,
    pub total: u32,
    pub items: Vec<RetryItem>,
}

/// A stored result with its answer trail, for the result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReview {
    pub result: QuizResult,
    pub percent: u32,
    pub details: Vec<QuizResultDetail>,
}

/// Per-lesson aggregate over all of a user's attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonQuizSummary {
    pub lesson_id: LessonId,
    pub lesson_title: String,
    pub lesson_sort_order: i32,
    pub course_id: CourseId,
    pub course_title: String,
    pub attempts: u32,
    pub best_score: u32,
    pub best_total: u32,
    pub best_percent: u32,
    pub last_taken_at: DateTime<Utc>,
    pub latest_result_id: ResultId,
}

/// Admin view over one lesson's attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonResults {
    pub results: Vec<QuizResult>,
    pub total_attempts: u32,
    pub average_score: Option<f64>,
}

/// Admin view over how one question is being answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionStats {
    pub question: QuizQuestion,
    pub total_answers: u32,
    pub correct_answers: u32,
    /// `None` until anyone has answered the question.
    pub correct_percent: Option<u32>,
    /// Pick counts per choice, in choice order.
    pub choice_counts: Vec<(QuizChoice, u32)>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Administers quiz attempts: grading, the durable answer trail, the
/// ephemeral retry flow, and the score summaries.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn ResultRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            lessons,
            enrollments,
            quizzes,
            results,
        }
    }

    /// The questions to present for a lesson's quiz, in order.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::LessonNotFound` for an unknown lesson,
    /// `QuizServiceError::NoQuestions` when the lesson has none, access
    /// errors for unenrolled non-admins, and storage errors unchanged.
    pub async fn quiz_questions(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
    ) -> Result<Vec<QuizQuestion>, QuizServiceError> {
        let lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await?
            .ok_or(QuizServiceError::LessonNotFound)?;
        ensure_course_access(actor, lesson.course_id(), self.enrollments.as_ref()).await?;

        let questions = self.quizzes.questions_for_lesson(lesson_id).await?;
        if questions.is_empty() {
            return Err(QuizServiceError::NoQuestions);
        }
        Ok(questions)
    }

    /// Grade one attempt and persist it with its answer trail.
    ///
    /// Unanswered questions are skipped: no detail row, no score
    /// contribution, but they still count toward `total_questions`
    /// (questions presented). An answer whose choice id does not resolve
    /// against the question's stored choices is skipped the same way. The
    /// whole write is one unit of work at the storage layer.
    ///
    /// # Errors
    ///
    /// Same as [`QuizService::quiz_questions`].
    pub async fn take_quiz(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
        answers: &HashMap<QuestionId, ChoiceId>,
    ) -> Result<GradedAttempt, QuizServiceError> {
        let questions = self.quiz_questions(actor, lesson_id).await?;

        let mut answered = Vec::new();
        let mut correct = 0u32;
        for question in &questions {
            let Some(choice_id) = answers.get(&question.id()) else {
                continue;
            };
            let Some(choice) = question.choice(*choice_id) else {
                continue;
            };
            if choice.is_correct() {
                correct += 1;
            }
            answered.push(AnswerRecord {
                question_id: question.id(),
                choice_id: choice.id(),
                is_correct: choice.is_correct(),
            });
        }

        let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        let record = QuizAttemptRecord {
            user_id: actor.id(),
            lesson_id,
            score: correct,
            total_questions: total,
            taken_at: self.clock.now(),
            answers: answered,
        };
        let result_id = self.results.record_attempt(&record).await?;
        tracing::info!(
            user = %actor.id(),
            lesson = %lesson_id,
            score = correct,
            total,
            "quiz attempt recorded"
        );

        Ok(GradedAttempt {
            result_id,
            score: correct,
            total_questions: total,
            percent: percent(correct, total),
        })
    }

    /// A stored result with its answer trail. Owner or admin only.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::ResultNotFound` for an unknown id,
    /// `QuizServiceError::Forbidden` for other users, and storage errors
    /// unchanged.
    pub async fn result_review(
        &self,
        actor: &Actor,
        result_id: ResultId,
    ) -> Result<ResultReview, QuizServiceError> {
        let result = self
            .results
            .get_result(result_id)
            .await?
            .ok_or(QuizServiceError::ResultNotFound)?;
        if result.user_id() != actor.id() && !actor.can_author() {
            return Err(QuizServiceError::Forbidden);
        }

        let details = self.results.details_for_result(result_id).await?;
        Ok(ResultReview {
            percent: result.percent(),
            result,
            details,
        })
    }

    /// Re-derive the questions the user got wrong in a prior result.
    ///
    /// Owner only. An all-correct result yields
    /// [`RetryPrompt::NothingToRetry`], which is a success state.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::ResultNotFound` for an unknown id,
    /// `QuizServiceError::Forbidden` for other users, and storage errors
    /// unchanged.
    pub async fn retry_incorrect(
        &self,
        user: UserId,
        result_id: ResultId,
    ) -> Result<RetryPrompt, QuizServiceError> {
        let wrong = self.wrong_details(user, result_id).await?;
        if wrong.is_empty() {
            return Ok(RetryPrompt::NothingToRetry);
        }

        let mut questions = Vec::with_capacity(wrong.len());
        for detail in &wrong {
            if let Some(question) = self.quizzes.get_question(detail.question_id()).await? {
                questions.push(question);
            }
        }
        Ok(RetryPrompt::Questions(questions))
    }

    /// Score a retry run over the previously wrong questions.
    ///
    /// Deliberately ephemeral: nothing is persisted and the original
    /// result is untouched; the return value is the whole outcome.
    ///
    /// # Errors
    ///
    /// Same as [`QuizService::retry_incorrect`].
    pub async fn score_retry(
        &self,
        user: UserId,
        result_id: ResultId,
        answers: &HashMap<QuestionId, ChoiceId>,
    ) -> Result<RetryReview, QuizServiceError> {
        let wrong = self.wrong_details(user, result_id).await?;

        let mut items = Vec::with_capacity(wrong.len());
        let mut score = 0u32;
        for detail in &wrong {
            let Some(question) = self.quizzes.get_question(detail.question_id()).await? else {
                continue;
            };
            let selected = answers
                .get(&question.id())
                .and_then(|choice_id| question.choice(*choice_id));
            let is_correct = selected.is_some_and(QuizChoice::is_correct);
            if is_correct {
                score += 1;
            }
            items.push(RetryItem {
                question_id: question.id(),
                question_text: question.text().to_owned(),
                explanation: question.explanation().map(str::to_owned),
                selected_text: selected.map(|c| c.text().to_owned()),
                is_correct,
                correct_text: question.correct_choice().map(|c| c.text().to_owned()),
            });
        }

        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Ok(RetryReview {
            score,
            total,
            items,
        })
    }

    /// Per-lesson aggregates over all of a user's attempts, ordered by
    /// (course title, lesson sort order).
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged.
    pub async fn summary_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<LessonQuizSummary>, QuizServiceError> {
        // Newest first, so the first event per lesson is the latest attempt.
        let events = self.results.attempts_with_context(user).await?;

        let mut by_lesson: HashMap<LessonId, LessonQuizSummary> = HashMap::new();
        for event in &events {
            let result = &event.result;
            let entry = by_lesson
                .entry(result.lesson_id())
                .or_insert_with(|| LessonQuizSummary {
                    lesson_id: result.lesson_id(),
                    lesson_title: event.lesson_title.clone(),
                    lesson_sort_order: event.lesson_sort_order,
                    course_id: event.course_id,
                    course_title: event.course_title.clone(),
                    attempts: 0,
                    best_score: 0,
                    best_total: result.total_questions(),
                    best_percent: 0,
                    last_taken_at: result.taken_at(),
                    latest_result_id: result.id(),
                });

            entry.attempts += 1;
            if result.score() > entry.best_score {
                entry.best_score = result.score();
                entry.best_total = result.total_questions();
                entry.best_percent = percent(result.score(), result.total_questions());
            }
            if result.taken_at() > entry.last_taken_at {
                entry.last_taken_at = result.taken_at();
                entry.latest_result_id = result.id();
            }
        }

        let mut summaries: Vec<LessonQuizSummary> = by_lesson.into_values().collect();
        summaries.sort_by(|a, b| {
            a.course_title
                .cmp(&b.course_title)
                .then(a.lesson_sort_order.cmp(&b.lesson_sort_order))
                .then(a.lesson_id.value().cmp(&b.lesson_id.value()))
        });
        Ok(summaries)
    }

    /// Every attempt for a lesson plus simple aggregates. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::AdminOnly` for non-admins and storage errors
    /// unchanged.
    pub async fn lesson_results(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
    ) -> Result<LessonResults, QuizServiceError> {
        ensure_author(actor)?;

        let results = self.results.results_for_lesson(lesson_id).await?;
        let total_attempts = u32::try_from(results.len()).unwrap_or(u32::MAX);
        let average_score = (total_attempts > 0).then(|| {
            let sum: u64 = results.iter().map(|r| u64::from(r.score())).sum();
            sum as f64 / f64::from(total_attempts)
        });

        Ok(LessonResults {
            results,
            total_attempts,
            average_score,
        })
    }

    /// Per-question answer statistics for a lesson. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::AdminOnly` for non-admins and storage errors
    /// unchanged.
    pub async fn question_stats(
        &self,
        actor: &Actor,
        lesson_id: LessonId,
    ) -> Result<Vec<QuestionStats>, QuizServiceError> {
        ensure_author(actor)?;

        let questions = self.quizzes.questions_for_lesson(lesson_id).await?;
        let mut stats = Vec::with_capacity(questions.len());
        for question in questions {
            let details = self.results.details_for_question(question.id()).await?;
            let total_answers = u32::try_from(details.len()).unwrap_or(u32::MAX);
            let correct_answers =
                u32::try_from(details.iter().filter(|d| d.is_correct()).count())
                    .unwrap_or(u32::MAX);
            let correct_percent =
                (total_answers > 0).then(|| percent(correct_answers, total_answers));

            let choice_counts = question
                .choices()
                .iter()
                .map(|choice| {
                    let picked = details.iter().filter(|d| d.choice_id() == choice.id()).count();
                    (choice.clone(), u32::try_from(picked).unwrap_or(u32::MAX))
                })
                .collect();

            stats.push(QuestionStats {
                question,
                total_answers,
                correct_answers,
                correct_percent,
                choice_counts,
            });
        }
        Ok(stats)
    }

    async fn wrong_details(
        &self,
        user: UserId,
        result_id: ResultId,
    ) -> Result<Vec<QuizResultDetail>, QuizServiceError> {
        let result = self
            .results
            .get_result(result_id)
            .await?
            .ok_or(QuizServiceError::ResultNotFound)?;
        if result.user_id() != user {
            return Err(QuizServiceError::Forbidden);
        }

        let details = self.results.details_for_result(result_id).await?;
        Ok(details.into_iter().filter(|d| !d.is_correct()).collect())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use elearn_core::model::{ChoiceContent, Course, Enrollment, Lesson, QuestionContent};
    use elearn_core::time::{fixed_clock, fixed_now};
    use storage::repository::{CourseRepository, InMemoryRepository};

    fn build_service(repo: &InMemoryRepository) -> QuizService {
        QuizService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    fn question_content(text: &str, correct: usize, sort_order: i32) -> QuestionContent {
        QuestionContent {
            text: text.into(),
            explanation: None,
            sort_order,
            choices: (1..=3)
                .map(|i| ChoiceContent {
                    text: format!("choice {i}"),
                    is_correct: i == correct,
                })
                .collect(),
        }
    }

    async fn seed_quiz(repo: &InMemoryRepository, question_count: usize) -> (LessonId, Vec<QuizQuestion>) {
        let course = Course::new(CourseId::new(1), "Course", None, None, None, fixed_now()).unwrap();
        repo.upsert_course(&course).await.unwrap();
        let lesson = Lesson::new(LessonId::new(1), course.id(), "Lesson", None, 1).unwrap();
        repo.upsert_lesson(&lesson).await.unwrap();

        let mut questions = Vec::new();
        for i in 1..=question_count {
            let question = repo
                .insert_question(lesson.id(), &question_content(&format!("Q{i}"), 1, i as i32))
                .await
                .unwrap();
            questions.push(question);
        }
        (lesson.id(), questions)
    }

    async fn enrolled_actor(repo: &InMemoryRepository) -> Actor {
        let user = UserId::new(10);
        repo.insert_enrollment(&Enrollment::new(user, CourseId::new(1), fixed_now()))
            .await
            .unwrap();
        Actor::student(user)
    }

    #[tokio::test]
    async fn scoring_counts_correct_answers_and_skips_unanswered() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 4).await;
        let actor = enrolled_actor(&repo).await;
        let service = build_service(&repo);

        // Answer 3 of 4 correctly, leave the last unanswered.
        let mut answers = HashMap::new();
        for question in &questions[..3] {
            answers.insert(question.id(), question.correct_choice().unwrap().id());
        }

        let graded = service.take_quiz(&actor, lesson_id, &answers).await.unwrap();
        assert_eq!(graded.score, 3);
        assert_eq!(graded.total_questions, 4);
        assert_eq!(graded.percent, 75);

        let details = repo.details_for_result(graded.result_id).await.unwrap();
        assert_eq!(details.len(), 3);
        assert!(details.iter().all(QuizResultDetail::is_correct));
    }

    #[tokio::test]
    async fn unknown_choice_ids_are_skipped() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 2).await;
        let actor = enrolled_actor(&repo).await;
        let service = build_service(&repo);

        let mut answers = HashMap::new();
        answers.insert(questions[0].id(), ChoiceId::new(9999));
        answers.insert(questions[1].id(), questions[1].correct_choice().unwrap().id());

        let graded = service.take_quiz(&actor, lesson_id, &answers).await.unwrap();
        assert_eq!(graded.score, 1);
        assert_eq!(graded.total_questions, 2);
        let details = repo.details_for_result(graded.result_id).await.unwrap();
        assert_eq!(details.len(), 1);
    }

    #[tokio::test]
    async fn lesson_without_questions_rejects_the_attempt() {
        let repo = InMemoryRepository::new();
        let (lesson_id, _) = seed_quiz(&repo, 0).await;
        let actor = enrolled_actor(&repo).await;
        let service = build_service(&repo);

        let err = service
            .take_quiz(&actor, lesson_id, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::NoQuestions));
        assert_eq!(repo.count_for_user(actor.id()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unenrolled_student_is_forbidden_admin_is_not() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 1).await;
        let service = build_service(&repo);

        let err = service
            .take_quiz(&Actor::student(UserId::new(99)), lesson_id, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Access(_)));

        let mut answers = HashMap::new();
        answers.insert(questions[0].id(), questions[0].correct_choice().unwrap().id());
        let graded = service
            .take_quiz(&Actor::admin(UserId::new(1)), lesson_id, &answers)
            .await
            .unwrap();
        assert_eq!(graded.score, 1);
    }

    #[tokio::test]
    async fn fully_correct_result_has_nothing_to_retry() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 2).await;
        let actor = enrolled_actor(&repo).await;
        let service = build_service(&repo);

        let answers: HashMap<_, _> = questions
            .iter()
            .map(|q| (q.id(), q.correct_choice().unwrap().id()))
            .collect();
        let graded = service.take_quiz(&actor, lesson_id, &answers).await.unwrap();

        let prompt = service
            .retry_incorrect(actor.id(), graded.result_id)
            .await
            .unwrap();
        assert_eq!(prompt, RetryPrompt::NothingToRetry);
        // No new result was persisted by the retry flow.
        assert_eq!(repo.count_for_user(actor.id()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn retry_presents_only_wrong_questions_and_scores_ephemerally() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 3).await;
        let actor = enrolled_actor(&repo).await;
        let service = build_service(&repo);

        // First question right, second wrong, third unanswered.
        let wrong_choice = questions[1]
            .choices()
            .iter()
            .find(|c| !c.is_correct())
            .unwrap();
        let mut answers = HashMap::new();
        answers.insert(questions[0].id(), questions[0].correct_choice().unwrap().id());
        answers.insert(questions[1].id(), wrong_choice.id());
        let graded = service.take_quiz(&actor, lesson_id, &answers).await.unwrap();
        assert_eq!(graded.score, 1);

        let prompt = service
            .retry_incorrect(actor.id(), graded.result_id)
            .await
            .unwrap();
        let RetryPrompt::Questions(retry_questions) = prompt else {
            panic!("expected questions to retry");
        };
        // Only the answered-wrong question comes back; the unanswered one
        // produced no detail row.
        assert_eq!(retry_questions.len(), 1);
        assert_eq!(retry_questions[0].id(), questions[1].id());

        let mut retry_answers = HashMap::new();
        retry_answers.insert(
            questions[1].id(),
            questions[1].correct_choice().unwrap().id(),
        );
        let review = service
            .score_retry(actor.id(), graded.result_id, &retry_answers)
            .await
            .unwrap();
        assert_eq!(review.score, 1);
        assert_eq!(review.total, 1);
        assert!(review.items[0].is_correct);
        assert_eq!(
            review.items[0].selected_text.as_deref(),
            review.items[0].correct_text.as_deref()
        );

        // Ephemeral: the stored attempt count and original score are unchanged.
        assert_eq!(repo.count_for_user(actor.id()).await.unwrap(), 1);
        let original = repo.get_result(graded.result_id).await.unwrap().unwrap();
        assert_eq!(original.score(), 1);
    }

    #[tokio::test]
    async fn retry_is_owner_only() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 1).await;
        let actor = enrolled_actor(&repo).await;
        let service = build_service(&repo);

        let mut answers = HashMap::new();
        answers.insert(questions[0].id(), questions[0].correct_choice().unwrap().id());
        let graded = service.take_quiz(&actor, lesson_id, &answers).await.unwrap();

        let err = service
            .retry_incorrect(UserId::new(77), graded.result_id)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Forbidden));
    }

    #[tokio::test]
    async fn summary_tracks_attempts_best_and_latest() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 2).await;
        let actor = enrolled_actor(&repo).await;

        // First attempt: 1/2 at t0.
        let mut answers = HashMap::new();
        answers.insert(questions[0].id(), questions[0].correct_choice().unwrap().id());
        let first = build_service(&repo)
            .take_quiz(&actor, lesson_id, &answers)
            .await
            .unwrap();

        // Second attempt: 2/2 one day later.
        let later = fixed_now() + chrono::Duration::days(1);
        let service = QuizService::new(
            Clock::fixed(later),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let answers: HashMap<_, _> = questions
            .iter()
            .map(|q| (q.id(), q.correct_choice().unwrap().id()))
            .collect();
        let second = service.take_quiz(&actor, lesson_id, &answers).await.unwrap();

        let summaries = service.summary_for_user(actor.id()).await.unwrap();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.attempts, 2);
        assert_eq!(summary.best_score, 2);
        assert_eq!(summary.best_percent, 100);
        assert_eq!(summary.last_taken_at, later);
        assert_eq!(summary.latest_result_id, second.result_id);
        assert_ne!(summary.latest_result_id, first.result_id);
    }

    #[tokio::test]
    async fn admin_stats_report_per_question_accuracy() {
        let repo = InMemoryRepository::new();
        let (lesson_id, questions) = seed_quiz(&repo, 2).await;
        let actor = enrolled_actor(&repo).await;
        let service = build_service(&repo);

        let wrong_choice = questions[1]
            .choices()
            .iter()
            .find(|c| !c.is_correct())
            .unwrap();
        let mut answers = HashMap::new();
        answers.insert(questions[0].id(), questions[0].correct_choice().unwrap().id());
        answers.insert(questions[1].id(), wrong_choice.id());
        service.take_quiz(&actor, lesson_id, &answers).await.unwrap();

        let admin = Actor::admin(UserId::new(1));
        let stats = service.question_stats(&admin, lesson_id).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].correct_percent, Some(100));
        assert_eq!(stats[1].correct_percent, Some(0));

        let results = service.lesson_results(&admin, lesson_id).await.unwrap();
        assert_eq!(results.total_attempts, 1);
        assert_eq!(results.average_score, Some(1.0));

        let err = service.question_stats(&actor, lesson_id).await.unwrap_err();
        assert!(matches!(err, QuizServiceError::Access(_)));
    }
}
