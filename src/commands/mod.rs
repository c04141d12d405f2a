//! Commands invoked by the front end (and the CLI)
//!
//! Every command takes the shared `AppState` and returns `Result<T, String>`
//! so errors cross the boundary as display text.

pub mod catalog;
pub mod chat;
pub mod favorites;
pub mod profile;

use tracing::warn;

use crate::db::AppState;
use crate::draft::WorkoutDraft;
use crate::models::{NewWorkoutLog, WorkoutLog, WorkoutLogChanges};
use crate::progress::{chart_series, logged_exercise_names, ChartPoint, Metric, ProgressStats};
use crate::workout_log;

/// Streaks and per-exercise progress for a user. A failed fetch yields the
/// empty stats rather than an error.
pub async fn get_progress_stats(state: &AppState, user_id: String) -> Result<ProgressStats, String> {
  match workout_log::fetch_by_user(&state.db, &user_id).await {
    Ok(logs) => Ok(ProgressStats::compute(&logs)),
    Err(e) => {
      warn!(user_id = %user_id, error = %e, "Failed to fetch workout logs for stats");
      Ok(ProgressStats::default())
    }
  }
}

/// Chart points for one exercise and metric, oldest first
pub async fn get_chart_series(
  state: &AppState,
  user_id: String,
  exercise_name: Option<String>,
  metric: String,
) -> Result<Vec<ChartPoint>, String> {
  let metric: Metric = metric.parse()?;

  match workout_log::fetch_by_user(&state.db, &user_id).await {
    Ok(logs) => Ok(chart_series(&logs, metric, exercise_name.as_deref())),
    Err(e) => {
      warn!(user_id = %user_id, error = %e, "Failed to fetch workout logs for chart");
      Ok(Vec::new())
    }
  }
}

/// Names available in the chart's exercise picker
pub async fn get_logged_exercise_names(state: &AppState, user_id: String) -> Result<Vec<String>, String> {
  let logs = workout_log::fetch_by_user(&state.db, &user_id)
    .await
    .map_err(|e| format!("Failed to fetch workout logs: {}", e))?;
  Ok(logged_exercise_names(&logs))
}

pub async fn get_workout_logs(state: &AppState, user_id: String) -> Result<Vec<WorkoutLog>, String> {
  workout_log::fetch_by_user(&state.db, &user_id)
    .await
    .map_err(|e| format!("Failed to fetch workout logs: {}", e))
}

pub async fn get_workout_log(state: &AppState, user_id: String, id: String) -> Result<WorkoutLog, String> {
  workout_log::get_workout_log(&state.db, &user_id, &id)
    .await
    .map_err(|e| format!("Failed to fetch workout log: {}", e))
}

pub async fn save_workout(state: &AppState, log: NewWorkoutLog) -> Result<String, String> {
  workout_log::add_workout_log(&state.db, &log)
    .await
    .map_err(|e| format!("Failed to save workout: {}", e))
}

/// Save the draft being edited for the signed-in user
pub async fn save_workout_draft(
  state: &AppState,
  draft: WorkoutDraft,
  user_id: Option<String>,
) -> Result<String, String> {
  let log = draft.into_new_log(user_id.as_deref()).map_err(|e| e.to_string())?;
  save_workout(state, log).await
}

pub async fn update_workout(
  state: &AppState,
  user_id: String,
  id: String,
  changes: WorkoutLogChanges,
) -> Result<WorkoutLog, String> {
  workout_log::update_workout_log(&state.db, &user_id, &id, &changes)
    .await
    .map_err(|e| format!("Failed to update workout: {}", e))
}

pub async fn delete_workout(state: &AppState, user_id: String, id: String) -> Result<(), String> {
  workout_log::delete_workout_log(&state.db, &user_id, &id)
    .await
    .map_err(|e| format!("Failed to delete workout: {}", e))
}
