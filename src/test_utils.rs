//! Test utilities and helpers for store and command tests
//!
//! - In-memory database setup/teardown
//! - Mock data factories for logs, exercises and profiles
//! - Seed helpers
//! - Float assertions

use crate::config::{AppConfig, ChatConfig};
use crate::db::AppState;
use crate::models::{
  Difficulty, ExerciseLog, ExerciseSet, MobilityProfile, MobilityType, NewExercise, NewWorkoutLog,
  OverallFeeling,
};
use crate::workout_log::add_workout_log;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) so every query sees the same in-memory database
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Config pointing at an in-memory database with chat disabled
pub fn test_config() -> AppConfig {
  AppConfig {
    database_url: "sqlite::memory:".to_string(),
    max_connections: 1,
    chat: ChatConfig::with_base(None, "http://127.0.0.1:9/v1").expect("valid test url"),
  }
}

/// App state over a migrated in-memory database
pub async fn setup_test_state() -> AppState {
  AppState::new(setup_test_db().await, test_config())
}

/// Insert one log per entry of `days_ago`, each with a single weighted
/// exercise. Returns the ids in insertion order.
pub async fn seed_test_logs(pool: &SqlitePool, user_id: &str, days_ago: &[i64]) -> Vec<String> {
  let mut ids = Vec::new();
  for days in days_ago {
    let log = create_mock_new_log(user_id, datetime_days_ago(*days));
    ids.push(add_workout_log(pool, &log).await.expect("Failed to insert test log"));
  }
  ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn create_mock_exercise_log(id: &str, name: &str, weight: f64, reps: f64) -> ExerciseLog {
  let value = |v: f64| Some(v).filter(|v| *v > 0.0);
  ExerciseLog {
    sets: vec![
      ExerciseSet {
        weight: value(weight),
        reps: value(reps),
        completed: true,
        ..Default::default()
      },
      ExerciseSet {
        weight: value(weight / 2.0),
        reps: value(reps),
        completed: true,
        ..Default::default()
      },
    ],
    difficulty: Some(3),
    pain_level: Some(1),
    ..ExerciseLog::new(id, name)
  }
}

pub fn create_mock_new_log(user_id: &str, date: DateTime<Utc>) -> NewWorkoutLog {
  NewWorkoutLog {
    id: None,
    user_id: user_id.to_string(),
    date,
    exercises: vec![
      create_mock_exercise_log("ex-press", "Seated Overhead Press", 10.0, 8.0),
      create_mock_exercise_log("ex-march", "Seated Marching", 0.0, 20.0),
    ],
    notes: Some("Felt steady".to_string()),
    overall_feeling: OverallFeeling::Good,
  }
}

pub fn create_mock_exercise(name: &str, difficulty: Difficulty, mobility: &[MobilityType]) -> NewExercise {
  NewExercise {
    name: name.to_string(),
    description: format!("{} performed slowly with control", name),
    benefits: "Builds strength".to_string(),
    mobility_types: mobility.to_vec(),
    difficulty: Some(difficulty),
    equipment: vec![],
    modifications: "Reduce range of motion".to_string(),
    target_areas: vec!["upper_body".to_string()],
    exercise_type: Some("strength".to_string()),
    image_url: None,
    video_url: String::new(),
  }
}

pub fn create_mock_profile(user_id: &str) -> MobilityProfile {
  MobilityProfile {
    user_id: user_id.to_string(),
    mobility_condition: "Wheelchair user".to_string(),
    condition_details: "T10 incomplete".to_string(),
    movement_limitations: vec!["Limited leg mobility".to_string()],
    assistive_devices: vec!["Wheelchair (manual)".to_string()],
    exercise_goals: vec!["Increase strength".to_string(), "Improve flexibility".to_string()],
    preferred_exercise_types: vec!["Seated exercises".to_string()],
    pain_areas: vec!["Shoulders".to_string()],
    created_at: None,
    updated_at: None,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let (left, right, tolerance): (f64, f64, f64) = ($left, $right, $tolerance);
    let diff = (left - right).abs();
    assert!(
      diff < tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      left,
      right,
      diff,
      tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workout_logs', 'exercises', 'favorites', 'profiles', 'feedback')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_logs_returns_ids() {
    let pool = setup_test_db().await;

    let ids = seed_test_logs(&pool, "user-1", &[0, 1, 2]).await;
    assert_eq!(ids.len(), 3);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_logs WHERE user_id = 'user-1'")
      .fetch_one(&pool)
      .await
      .expect("Failed to count logs");
    assert_eq!(count, 3);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_exercise_log_skips_zero_values() {
    let log = create_mock_exercise_log("ex-1", "March", 0.0, 12.0);
    assert!(log.sets.iter().all(|s| s.weight.is_none()));
    assert_eq!(log.sets[0].reps, Some(12.0));
  }

  #[test]
  fn test_assert_approx_eq_macro() {
    assert_approx_eq!(0.1_f64 + 0.2, 0.3, 1e-9);
    assert_approx_eq!(2.5, 2.5, 1e-9);
  }
}
