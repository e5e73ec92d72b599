use elearn_core::model::{UserId, UserProfile};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_profile_row},
};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let row = sqlx::query(
            r"
                SELECT user_id, display_name, avatar_filename, weekly_goal_lessons
                FROM user_profiles
                WHERE user_id = ?1
            ",
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let user = id_i64("user_id", profile.user_id().value())?;
        let weekly_goal = profile
            .weekly_goal_lessons()
            .map(i64::from);

        sqlx::query(
            r"
                INSERT INTO user_profiles (user_id, display_name, avatar_filename, weekly_goal_lessons)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id) DO UPDATE SET
                    display_name = excluded.display_name,
                    avatar_filename = excluded.avatar_filename,
                    weekly_goal_lessons = excluded.weekly_goal_lessons
            ",
        )
        .bind(user)
        .bind(profile.display_name())
        .bind(profile.avatar_filename())
        .bind(weekly_goal)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
