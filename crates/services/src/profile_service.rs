use std::sync::Arc;

use elearn_core::model::{UserId, UserProfile, parse_weekly_goal};
use storage::repository::ProfileRepository;

use crate::error::ProfileServiceError;

/// Raw profile-edit input as it arrives from a form.
///
/// `None` fields are left unchanged. An empty `weekly_goal` string clears
/// the goal back to "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub weekly_goal: Option<String>,
    pub avatar_filename: Option<String>,
}

/// Profile reads and edits; profiles are created lazily on first access.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Fetch a user's profile, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged.
    pub async fn get_or_create(&self, user: UserId) -> Result<UserProfile, ProfileServiceError> {
        if let Some(profile) = self.profiles.get_profile(user).await? {
            return Ok(profile);
        }
        let profile = UserProfile::new(user);
        self.profiles.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Apply a profile edit.
    ///
    /// The display name only changes on non-empty input; the weekly goal is
    /// parsed from its raw string (empty clears it); the avatar filename is
    /// stored as handed in (upload mechanics live outside the core).
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::InvalidWeeklyGoal` for non-numeric goal input
    /// and storage errors unchanged.
    pub async fn update(
        &self,
        user: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ProfileServiceError> {
        let mut profile = self.get_or_create(user).await?;

        if let Some(name) = &update.display_name {
            profile.set_display_name(name);
        }
        if let Some(raw) = &update.weekly_goal {
            profile.set_weekly_goal(parse_weekly_goal(raw)?);
        }
        if let Some(avatar) = &update.avatar_filename {
            profile.set_avatar_filename(avatar.clone());
        }

        self.profiles.upsert_profile(&profile).await?;
        tracing::debug!(user = %user, "profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn build_service(repo: &InMemoryRepository) -> ProfileService {
        ProfileService::new(Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn profile_is_created_on_first_access() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);
        let user = UserId::new(1);

        assert!(repo.get_profile(user).await.unwrap().is_none());
        let profile = service.get_or_create(user).await.unwrap();
        assert_eq!(profile.display_name(), None);
        assert!(repo.get_profile(user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_parses_goal_and_keeps_name_on_empty_input() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);
        let user = UserId::new(1);

        let profile = service
            .update(
                user,
                &ProfileUpdate {
                    display_name: Some("Alice".into()),
                    weekly_goal: Some("5".into()),
                    avatar_filename: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.display_name(), Some("Alice"));
        assert_eq!(profile.weekly_goal_lessons(), Some(5));

        // Empty name keeps the old one; empty goal clears it.
        let profile = service
            .update(
                user,
                &ProfileUpdate {
                    display_name: Some("   ".into()),
                    weekly_goal: Some(String::new()),
                    avatar_filename: Some("user1.png".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.display_name(), Some("Alice"));
        assert_eq!(profile.weekly_goal_lessons(), None);
        assert_eq!(profile.avatar_filename(), Some("user1.png"));
    }

    #[tokio::test]
    async fn invalid_goal_input_is_rejected() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);

        let err = service
            .update(
                UserId::new(1),
                &ProfileUpdate {
                    weekly_goal: Some("minus five".into()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileServiceError::Profile(_)));
    }
}
