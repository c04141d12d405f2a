//! Mobility questionnaire commands

use serde::Serialize;

use crate::db::AppState;
use crate::models::profile::{
  ASSISTIVE_DEVICES, EXERCISE_GOALS, EXERCISE_TYPES, MOBILITY_CONDITIONS, MOVEMENT_LIMITATIONS, PAIN_AREAS,
};
use crate::models::MobilityProfile;
use crate::profile;

/// Choices offered by the questionnaire
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOptions {
  pub mobility_conditions: &'static [&'static str],
  pub movement_limitations: &'static [&'static str],
  pub assistive_devices: &'static [&'static str],
  pub exercise_goals: &'static [&'static str],
  pub exercise_types: &'static [&'static str],
  pub pain_areas: &'static [&'static str],
}

pub fn get_profile_options() -> ProfileOptions {
  ProfileOptions {
    mobility_conditions: MOBILITY_CONDITIONS,
    movement_limitations: MOVEMENT_LIMITATIONS,
    assistive_devices: ASSISTIVE_DEVICES,
    exercise_goals: EXERCISE_GOALS,
    exercise_types: EXERCISE_TYPES,
    pain_areas: PAIN_AREAS,
  }
}

pub async fn get_profile(state: &AppState, user_id: String) -> Result<Option<MobilityProfile>, String> {
  profile::get_profile(&state.db, &user_id)
    .await
    .map_err(|e| format!("Failed to load profile: {}", e))
}

/// Validation failures come back verbatim so they can be shown as-is
pub async fn save_profile(state: &AppState, profile: MobilityProfile) -> Result<MobilityProfile, String> {
  profile::upsert_profile(&state.db, &profile).await.map_err(|e| match e {
    profile::ProfileError::Store(e) => format!("Failed to save profile: {}", e),
    validation => validation.to_string(),
  })
}
