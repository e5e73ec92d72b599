use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use elearn_core::model::{CourseId, UserId};
use elearn_core::time::start_of_day;
use storage::repository::{
    CompletionEvent, ProgressRepository, QuizAttemptEvent, ResultRepository,
};

use crate::error::HistoryError;

/// Fixed page size for each history list.
pub const HISTORY_PAGE_SIZE: u32 = 50;

/// Course/date filters for the history page.
///
/// Both dates are inclusive calendar days; the end date covers its whole
/// day. Build from raw query input with [`HistoryFilter::from_raw`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub course_id: Option<CourseId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl HistoryFilter {
    /// Parse raw `YYYY-MM-DD` bounds.
    ///
    /// A bound that fails to parse is dropped silently and the query
    /// proceeds unfiltered for that bound. An inverted range (start after
    /// end) drops both bounds. Defined fallbacks, not errors.
    #[must_use]
    pub fn from_raw(
        course_id: Option<CourseId>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Self {
        let parse = |raw: Option<&str>| {
            raw.map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        };

        let mut start = parse(start_date);
        let mut end = parse(end_date);
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                start = None;
                end = None;
            }
        }

        Self {
            course_id,
            start_date: start,
            end_date: end,
        }
    }

    /// Instant bounds for the store: start-of-day inclusive to
    /// start-of-next-day exclusive.
    fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.start_date.map(start_of_day),
            self.end_date.map(|d| start_of_day(d + Duration::days(1))),
        )
    }
}

/// The history page: two independent result sets, side by side.
#[derive(Debug, Clone)]
pub struct History {
    pub completions: Vec<CompletionEvent>,
    pub attempts: Vec<QuizAttemptEvent>,
}

/// Filtered event lists for the history page.
#[derive(Clone)]
pub struct HistoryService {
    progress: Arc<dyn ProgressRepository>,
    results: Arc<dyn ResultRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>, results: Arc<dyn ResultRepository>) -> Self {
        Self { progress, results }
    }

    /// A user's completion and quiz events under the same filters, each
    /// newest first and capped at [`HISTORY_PAGE_SIZE`]. The two sets stay
    /// independent; nothing joins them.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged.
    pub async fn history(
        &self,
        user: UserId,
        filter: &HistoryFilter,
    ) -> Result<History, HistoryError> {
        let (from, until) = filter.bounds();

        let completions = self
            .progress
            .completion_history(user, filter.course_id, from, until, HISTORY_PAGE_SIZE)
            .await?;
        let attempts = self
            .results
            .attempt_history(user, filter.course_id, from, until, HISTORY_PAGE_SIZE)
            .await?;

        Ok(History {
            completions,
            attempts,
        })
    }
}
