use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("weekly goal must be a whole number of lessons (0 or more)")]
    InvalidWeeklyGoal,
}

/// Per-user display settings and the optional weekly lesson goal.
///
/// Created lazily on first profile access. A `None` weekly goal means "no
/// goal set", which is distinct from a goal of 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    user_id: UserId,
    display_name: Option<String>,
    avatar_filename: Option<String>,
    weekly_goal_lessons: Option<u32>,
}

impl UserProfile {
    /// An empty profile for a user who has not configured anything yet.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: None,
            avatar_filename: None,
            weekly_goal_lessons: None,
        }
    }

    /// Rebuild a profile from persisted fields.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        display_name: Option<String>,
        avatar_filename: Option<String>,
        weekly_goal_lessons: Option<u32>,
    ) -> Self {
        Self {
            user_id,
            display_name,
            avatar_filename,
            weekly_goal_lessons,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn avatar_filename(&self) -> Option<&str> {
        self.avatar_filename.as_deref()
    }

    #[must_use]
    pub fn weekly_goal_lessons(&self) -> Option<u32> {
        self.weekly_goal_lessons
    }

    /// Set the display name; empty input leaves the existing name in place.
    pub fn set_display_name(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.display_name = Some(name.to_owned());
        }
    }

    pub fn set_avatar_filename(&mut self, filename: impl Into<String>) {
        self.avatar_filename = Some(filename.into());
    }

    pub fn set_weekly_goal(&mut self, goal: Option<u32>) {
        self.weekly_goal_lessons = goal;
    }
}

/// Parse raw weekly-goal input: empty means "unset", otherwise a
/// non-negative whole number.
///
/// # Errors
///
/// Returns `ProfileError::InvalidWeeklyGoal` for non-numeric or negative
/// input.
pub fn parse_weekly_goal(raw: &str) -> Result<Option<u32>, ProfileError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| ProfileError::InvalidWeeklyGoal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_goal_input_means_unset() {
        assert_eq!(parse_weekly_goal(""), Ok(None));
        assert_eq!(parse_weekly_goal("   "), Ok(None));
    }

    #[test]
    fn numeric_goal_is_parsed() {
        assert_eq!(parse_weekly_goal("5"), Ok(Some(5)));
        assert_eq!(parse_weekly_goal("0"), Ok(Some(0)));
    }

    #[test]
    fn negative_or_garbage_goal_is_rejected() {
        assert_eq!(parse_weekly_goal("-1"), Err(ProfileError::InvalidWeeklyGoal));
        assert_eq!(parse_weekly_goal("five"), Err(ProfileError::InvalidWeeklyGoal));
    }

    #[test]
    fn set_display_name_ignores_empty_input() {
        let mut profile = UserProfile::new(UserId::new(1));
        profile.set_display_name("Alice");
        profile.set_display_name("   ");
        assert_eq!(profile.display_name(), Some("Alice"));
    }
}
