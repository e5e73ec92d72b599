use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChoiceId, LessonId, QuestionId};

/// Number of choice slots offered by the authoring form.
pub const CHOICE_SLOTS: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question text cannot be empty")]
    EmptyQuestionText,

    #[error("a question must have at least one choice")]
    NoChoices,

    #[error("a question can have at most {CHOICE_SLOTS} choices")]
    TooManyChoices,
}

/// A single authoring validation failure.
///
/// Drafts are validated exhaustively; callers receive every applicable error
/// in one pass so the form can be redisplayed with all messages at once.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DraftError {
    #[error("question text is required")]
    EmptyQuestionText,

    #[error("select the correct choice")]
    MissingCorrectChoice,

    #[error("correct choice selection is invalid")]
    InvalidCorrectChoice,

    #[error("at least one choice is required")]
    NoChoices,

    #[error("the selected correct choice has no text")]
    CorrectChoiceEmpty,

    #[error("sort order must be a whole number")]
    InvalidSortOrder,
}

//
// ─── CHOICE ────────────────────────────────────────────────────────────────────
//

/// One selectable answer for a quiz question.
///
/// The stored `is_correct` flag is trusted by the scorer; the authoring flow
/// guarantees exactly one correct choice per question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizChoice {
    id: ChoiceId,
    question_id: QuestionId,
    text: String,
    is_correct: bool,
}

impl QuizChoice {
    #[must_use]
    pub fn new(id: ChoiceId, question_id: QuestionId, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id,
            question_id,
            text: text.into(),
            is_correct,
        }
    }

    #[must_use]
    pub fn id(&self) -> ChoiceId {
        self.id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question belonging to a lesson, owning its choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    id: QuestionId,
    lesson_id: LessonId,
    text: String,
    explanation: Option<String>,
    sort_order: i32,
    choices: Vec<QuizChoice>,
}

impl QuizQuestion {
    /// Assemble a question from its parts (typically by a repository).
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the text is empty or the choice count is
    /// outside `1..=CHOICE_SLOTS`. The single-correct-choice invariant is
    /// not re-checked here; it is enforced by draft validation.
    pub fn from_parts(
        id: QuestionId,
        lesson_id: LessonId,
        text: impl Into<String>,
        explanation: Option<String>,
        sort_order: i32,
        choices: Vec<QuizChoice>,
    ) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyQuestionText);
        }
        if choices.is_empty() {
            return Err(QuizError::NoChoices);
        }
        if choices.len() > CHOICE_SLOTS {
            return Err(QuizError::TooManyChoices);
        }

        Ok(Self {
            id,
            lesson_id,
            text: text.trim().to_owned(),
            explanation: explanation.filter(|e| !e.trim().is_empty()),
            sort_order,
            choices,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    #[must_use]
    pub fn choices(&self) -> &[QuizChoice] {
        &self.choices
    }

    /// Look up one of this question's choices by id.
    #[must_use]
    pub fn choice(&self, id: ChoiceId) -> Option<&QuizChoice> {
        self.choices.iter().find(|c| c.id() == id)
    }

    /// The choice flagged as correct, if the stored data carries one.
    #[must_use]
    pub fn correct_choice(&self) -> Option<&QuizChoice> {
        self.choices.iter().find(|c| c.is_correct())
    }

    /// Ordering key within a lesson: `sort_order`, ties broken by id.
    #[must_use]
    pub fn order_key(&self) -> (i32, u64) {
        (self.sort_order, self.id.value())
    }
}

//
// ─── AUTHORING DRAFT ───────────────────────────────────────────────────────────
//

/// Validated content for a question, ready to be persisted.
///
/// Ids are assigned by the repository at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionContent {
    pub text: String,
    pub explanation: Option<String>,
    pub sort_order: i32,
    pub choices: Vec<ChoiceContent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceContent {
    pub text: String,
    pub is_correct: bool,
}

/// Raw authoring input for a question, as it arrives from a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question_text: String,
    pub explanation: String,
    /// Raw sort order input; empty defaults to 1.
    pub sort_order: String,
    /// Up to four choice texts; empty slots are ignored.
    pub choices: [String; CHOICE_SLOTS],
    /// 1-based index of the correct choice, as raw input.
    pub correct_choice: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft, collecting every failure.
    ///
    /// # Errors
    ///
    /// Returns the complete list of `DraftError`s found; the draft itself is
    /// untouched so the caller can redisplay it.
    pub fn validate(&self) -> Result<QuestionContent, Vec<DraftError>> {
        let mut errors = Vec::new();

        let text = self.question_text.trim();
        if text.is_empty() {
            errors.push(DraftError::EmptyQuestionText);
        }

        let sort_order = match self.sort_order.trim() {
            "" => 1,
            raw => raw.parse().unwrap_or_else(|_| {
                errors.push(DraftError::InvalidSortOrder);
                1
            }),
        };

        let correct_index = match self.correct_choice.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(DraftError::MissingCorrectChoice);
                None
            }
            Some(raw) => match raw.parse::<usize>() {
                Ok(i) if (1..=CHOICE_SLOTS).contains(&i) => Some(i),
                _ => {
                    errors.push(DraftError::InvalidCorrectChoice);
                    None
                }
            },
        };

        let trimmed: Vec<&str> = self.choices.iter().map(|c| c.trim()).collect();
        if trimmed.iter().all(|c| c.is_empty()) {
            errors.push(DraftError::NoChoices);
        }
        if let Some(i) = correct_index {
            if trimmed[i - 1].is_empty() {
                errors.push(DraftError::CorrectChoiceEmpty);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let correct_index = correct_index.unwrap_or_default();
        let choices = trimmed
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(i, text)| ChoiceContent {
                text: (*text).to_owned(),
                is_correct: i + 1 == correct_index,
            })
            .collect();

        let explanation = self.explanation.trim();

        Ok(QuestionContent {
            text: text.to_owned(),
            explanation: (!explanation.is_empty()).then(|| explanation.to_owned()),
            sort_order,
            choices,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
