//! Mobility questionnaire storage and the context summary handed to chat

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;

use crate::chat::ProfileContext;
use crate::db::{parse_db_timestamp, to_db_timestamp, StoreError};
use crate::models::MobilityProfile;

#[derive(Error, Debug, PartialEq)]
pub enum ProfileError {
  #[error("Please select your mobility condition")]
  MissingCondition,

  #[error("Please select at least one exercise goal")]
  MissingGoals,

  #[error(transparent)]
  Store(#[from] StoreError),
}

impl MobilityProfile {
  /// Questionnaire completeness: a condition and at least one goal
  pub fn validate(&self) -> Result<(), ProfileError> {
    if self.mobility_condition.trim().is_empty() {
      return Err(ProfileError::MissingCondition);
    }
    if self.exercise_goals.iter().all(|g| g.trim().is_empty()) {
      return Err(ProfileError::MissingGoals);
    }
    Ok(())
  }

  /// Bullet list describing the user, as embedded in chat system prompts
  pub fn context_summary(&self) -> String {
    ProfileContext::from(self).summary()
  }
}

fn json_list(row: &SqliteRow, column: &str) -> Result<Vec<String>, StoreError> {
  let json: String = row.get(column);
  Ok(serde_json::from_str(&json)?)
}

pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<MobilityProfile>, StoreError> {
  let row = sqlx::query(
    r#"
    SELECT user_id, mobility_condition, condition_details, movement_limitations_json,
           assistive_devices_json, exercise_goals_json, preferred_exercise_types_json,
           pain_areas_json, created_at, updated_at
    FROM profiles
    WHERE user_id = ?1
    "#,
  )
  .bind(user_id)
  .fetch_optional(pool)
  .await?;

  let Some(row) = row else {
    return Ok(None);
  };

  Ok(Some(MobilityProfile {
    user_id: row.get("user_id"),
    mobility_condition: row.get("mobility_condition"),
    condition_details: row.get("condition_details"),
    movement_limitations: json_list(&row, "movement_limitations_json")?,
    assistive_devices: json_list(&row, "assistive_devices_json")?,
    exercise_goals: json_list(&row, "exercise_goals_json")?,
    preferred_exercise_types: json_list(&row, "preferred_exercise_types_json")?,
    pain_areas: json_list(&row, "pain_areas_json")?,
    created_at: parse_db_timestamp(row.get("created_at")),
    updated_at: parse_db_timestamp(row.get("updated_at")),
  }))
}

/// Validate and store the questionnaire. The first save sets `created_at`;
/// later saves keep it and bump `updated_at`.
pub async fn upsert_profile(pool: &SqlitePool, profile: &MobilityProfile) -> Result<MobilityProfile, ProfileError> {
  profile.validate()?;
  let now = to_db_timestamp(&Utc::now());

  sqlx::query(
    r#"
    INSERT INTO profiles (
      user_id, mobility_condition, condition_details, movement_limitations_json,
      assistive_devices_json, exercise_goals_json, preferred_exercise_types_json,
      pain_areas_json, created_at, updated_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
    ON CONFLICT(user_id) DO UPDATE SET
      mobility_condition = excluded.mobility_condition,
      condition_details = excluded.condition_details,
      movement_limitations_json = excluded.movement_limitations_json,
      assistive_devices_json = excluded.assistive_devices_json,
      exercise_goals_json = excluded.exercise_goals_json,
      preferred_exercise_types_json = excluded.preferred_exercise_types_json,
      pain_areas_json = excluded.pain_areas_json,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(&profile.user_id)
  .bind(profile.mobility_condition.trim())
  .bind(&profile.condition_details)
  .bind(serde_json::to_string(&profile.movement_limitations).map_err(StoreError::from)?)
  .bind(serde_json::to_string(&profile.assistive_devices).map_err(StoreError::from)?)
  .bind(serde_json::to_string(&profile.exercise_goals).map_err(StoreError::from)?)
  .bind(serde_json::to_string(&profile.preferred_exercise_types).map_err(StoreError::from)?)
  .bind(serde_json::to_string(&profile.pain_areas).map_err(StoreError::from)?)
  .bind(&now)
  .execute(pool)
  .await
  .map_err(StoreError::from)?;

  info!(user_id = %profile.user_id, "Saved mobility profile");

  get_profile(pool, &profile.user_id)
    .await?
    .ok_or_else(|| StoreError::not_found("Profile", profile.user_id.clone()).into())
}
