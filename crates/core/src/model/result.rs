use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ChoiceId, LessonId, QuestionId, ResultId, UserId};

/// One quiz attempt: the score over the questions presented.
///
/// Immutable once the score has been finalized; re-attempts create new rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    id: ResultId,
    user_id: UserId,
    lesson_id: LessonId,
    score: u32,
    total_questions: u32,
    taken_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn new(
        id: ResultId,
        user_id: UserId,
        lesson_id: LessonId,
        score: u32,
        total_questions: u32,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            lesson_id,
            score,
            total_questions,
            taken_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    /// Count of correctly answered questions.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Count of questions presented at attempt time (answered or not).
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Display percentage, floored; 0 when no questions were presented.
    #[must_use]
    pub fn percent(&self) -> u32 {
        percent(self.score, self.total_questions)
    }
}

/// Floored integer percentage, defined as 0 for a zero denominator.
#[must_use]
pub fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 { 0 } else { part * 100 / whole }
}

/// The answer trail for one question within a result.
///
/// `is_correct` is a snapshot taken at submission time so history stays
/// accurate if choices are edited later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResultDetail {
    result_id: ResultId,
    question_id: QuestionId,
    choice_id: ChoiceId,
    is_correct: bool,
}

impl QuizResultDetail {
    #[must_use]
    pub fn new(
        result_id: ResultId,
        question_id: QuestionId,
        choice_id: ChoiceId,
        is_correct: bool,
    ) -> Self {
        Self {
            result_id,
            question_id,
            choice_id,
            is_correct,
        }
    }

    #[must_use]
    pub fn result_id(&self) -> ResultId {
        self.result_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn choice_id(&self) -> ChoiceId {
        self.choice_id
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}
