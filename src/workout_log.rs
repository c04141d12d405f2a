//! Workout log persistence
//!
//! One row per session; the exercise list is kept as a JSON document so a
//! log is always read and written as a whole.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{from_db_timestamp, parse_db_timestamp, to_db_timestamp, StoreError};
use crate::models::{ExerciseLog, NewWorkoutLog, OverallFeeling, WorkoutLog, WorkoutLogChanges};

const SELECT_COLUMNS: &str = r#"
  SELECT id, user_id, date, exercises_json, notes, overall_feeling, created_at, updated_at
  FROM workout_logs
"#;

fn row_to_log(row: &SqliteRow) -> Result<WorkoutLog, StoreError> {
  let date: String = row.get("date");
  let exercises_json: String = row.get("exercises_json");
  let feeling: String = row.get("overall_feeling");

  Ok(WorkoutLog {
    id: row.get("id"),
    user_id: row.get("user_id"),
    date: from_db_timestamp(&date)?,
    exercises: serde_json::from_str::<Vec<ExerciseLog>>(&exercises_json)?,
    notes: row.get("notes"),
    overall_feeling: feeling.parse().unwrap_or_default(),
    created_at: parse_db_timestamp(row.get("created_at")),
    updated_at: parse_db_timestamp(row.get("updated_at")),
  })
}

/// Insert a new log, returning its id (generated when the draft has none)
pub async fn add_workout_log(pool: &SqlitePool, log: &NewWorkoutLog) -> Result<String, StoreError> {
  let id = log
    .id
    .clone()
    .filter(|id| !id.is_empty())
    .unwrap_or_else(|| Uuid::new_v4().to_string());
  let now = to_db_timestamp(&Utc::now());
  let exercises_json = serde_json::to_string(&log.exercises)?;

  sqlx::query(
    r#"
    INSERT INTO workout_logs (
      id, user_id, date, exercises_json, notes, overall_feeling, created_at, updated_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
    "#,
  )
  .bind(&id)
  .bind(&log.user_id)
  .bind(to_db_timestamp(&log.date))
  .bind(&exercises_json)
  .bind(&log.notes)
  .bind(log.overall_feeling.as_str())
  .bind(&now)
  .execute(pool)
  .await?;

  info!(log_id = %id, user_id = %log.user_id, exercises = log.exercises.len(), "Saved workout log");
  Ok(id)
}

/// Apply the given changes to an existing log owned by `user_id`
pub async fn update_workout_log(
  pool: &SqlitePool,
  user_id: &str,
  id: &str,
  changes: &WorkoutLogChanges,
) -> Result<WorkoutLog, StoreError> {
  let mut log = get_workout_log(pool, user_id, id).await?;

  if let Some(date) = changes.date {
    log.date = date;
  }
  if let Some(exercises) = &changes.exercises {
    log.exercises = exercises.clone();
  }
  if let Some(notes) = &changes.notes {
    log.notes = Some(notes.clone()).filter(|n| !n.is_empty());
  }
  if let Some(feeling) = changes.overall_feeling {
    log.overall_feeling = feeling;
  }
  let updated_at = Utc::now();

  sqlx::query(
    r#"
    UPDATE workout_logs
    SET date = ?1,
        exercises_json = ?2,
        notes = ?3,
        overall_feeling = ?4,
        updated_at = ?5
    WHERE id = ?6 AND user_id = ?7
    "#,
  )
  .bind(to_db_timestamp(&log.date))
  .bind(serde_json::to_string(&log.exercises)?)
  .bind(&log.notes)
  .bind(log.overall_feeling.as_str())
  .bind(to_db_timestamp(&updated_at))
  .bind(id)
  .bind(user_id)
  .execute(pool)
  .await?;

  log.updated_at = Some(updated_at);
  info!(log_id = %id, user_id = %user_id, "Updated workout log");
  Ok(log)
}

/// Remove a log permanently. Logs of other users are reported as missing.
pub async fn delete_workout_log(pool: &SqlitePool, user_id: &str, id: &str) -> Result<(), StoreError> {
  let result = sqlx::query("DELETE FROM workout_logs WHERE id = ?1 AND user_id = ?2")
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(StoreError::not_found("Workout log", id));
  }

  info!(log_id = %id, user_id = %user_id, "Deleted workout log");
  Ok(())
}

pub async fn get_workout_log(pool: &SqlitePool, user_id: &str, id: &str) -> Result<WorkoutLog, StoreError> {
  let row = sqlx::query(&format!("{} WHERE id = ?1 AND user_id = ?2", SELECT_COLUMNS))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("Workout log", id))?;

  row_to_log(&row)
}

/// All logs of a user, most recent first
pub async fn fetch_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<WorkoutLog>, StoreError> {
  let rows = sqlx::query(&format!("{} WHERE user_id = ?1 ORDER BY date DESC, id ASC", SELECT_COLUMNS))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

  let logs = rows.iter().map(row_to_log).collect::<Result<Vec<_>, _>>()?;
  debug!(user_id = %user_id, count = logs.len(), "Fetched workout logs");
  Ok(logs)
}

/// Number of sessions a user has logged with the given feeling
pub async fn count_by_feeling(
  pool: &SqlitePool,
  user_id: &str,
  feeling: OverallFeeling,
) -> Result<i64, StoreError> {
  let count: i64 = sqlx::query_scalar(
    "SELECT COUNT(*) FROM workout_logs WHERE user_id = ?1 AND overall_feeling = ?2",
  )
  .bind(user_id)
  .bind(feeling.as_str())
  .fetch_one(pool)
  .await?;
  Ok(count)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{create_mock_exercise_log, create_mock_new_log, setup_test_db, teardown_test_db};
  use chrono::Duration;

  #[tokio::test]
  async fn test_add_and_get_roundtrip() {
    let pool = setup_test_db().await;
    let new_log = create_mock_new_log("user-1", Utc::now());

    let id = add_workout_log(&pool, &new_log).await.expect("Should insert");
    assert!(Uuid::parse_str(&id).is_ok());

    let log = get_workout_log(&pool, "user-1", &id).await.expect("Should load");
    assert_eq!(log.user_id, "user-1");
    assert_eq!(log.exercises, new_log.exercises);
    assert_eq!(log.overall_feeling, OverallFeeling::Good);
    assert!(log.created_at.is_some());
    assert!((log.date - new_log.date).num_milliseconds().abs() < 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_add_keeps_supplied_id() {
    let pool = setup_test_db().await;
    let mut new_log = create_mock_new_log("user-1", Utc::now());
    new_log.id = Some("fixed-id".to_string());

    let id = add_workout_log(&pool, &new_log).await.unwrap();
    assert_eq!(id, "fixed-id");

    // A second insert with the same id violates the primary key
    let err = add_workout_log(&pool, &new_log).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_fetch_by_user_newest_first_and_scoped() {
    let pool = setup_test_db().await;
    let now = Utc::now();

    for days_ago in [3, 0, 1] {
      add_workout_log(&pool, &create_mock_new_log("user-1", now - Duration::days(days_ago)))
        .await
        .unwrap();
    }
    add_workout_log(&pool, &create_mock_new_log("user-2", now)).await.unwrap();

    let logs = fetch_by_user(&pool, "user-1").await.unwrap();
    assert_eq!(logs.len(), 3);
    assert!(logs.windows(2).all(|w| w[0].date >= w[1].date));
    assert!(logs.iter().all(|l| l.user_id == "user-1"));

    assert!(fetch_by_user(&pool, "nobody").await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_update_replaces_given_fields_only() {
    let pool = setup_test_db().await;
    let new_log = create_mock_new_log("user-1", Utc::now());
    let id = add_workout_log(&pool, &new_log).await.unwrap();

    let changes = WorkoutLogChanges {
      overall_feeling: Some(OverallFeeling::Tired),
      exercises: Some(vec![create_mock_exercise_log("ex-9", "Seated march", 20.0, 0.0)]),
      ..Default::default()
    };
    let updated = update_workout_log(&pool, "user-1", &id, &changes).await.unwrap();
    assert_eq!(updated.overall_feeling, OverallFeeling::Tired);

    let reloaded = get_workout_log(&pool, "user-1", &id).await.unwrap();
    assert_eq!(reloaded.overall_feeling, OverallFeeling::Tired);
    assert_eq!(reloaded.exercises.len(), 1);
    assert_eq!(reloaded.exercises[0].exercise_id, "ex-9");
    assert_eq!(reloaded.notes, new_log.notes);
    assert!(reloaded.updated_at >= reloaded.created_at);

    assert_eq!(count_by_feeling(&pool, "user-1", OverallFeeling::Tired).await.unwrap(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_update_and_delete_missing_log() {
    let pool = setup_test_db().await;

    let err = update_workout_log(&pool, "user-1", "missing", &WorkoutLogChanges::default())
      .await
      .unwrap_err();
    assert_eq!(err, StoreError::not_found("Workout log", "missing"));

    let err = delete_workout_log(&pool, "user-1", "missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_delete_is_permanent() {
    let pool = setup_test_db().await;
    let id = add_workout_log(&pool, &create_mock_new_log("user-1", Utc::now())).await.unwrap();

    delete_workout_log(&pool, "user-1", &id).await.expect("Should delete");
    assert!(matches!(get_workout_log(&pool, "user-1", &id).await, Err(StoreError::NotFound { .. })));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_logs_of_other_users_are_not_found() {
    let pool = setup_test_db().await;
    let id = add_workout_log(&pool, &create_mock_new_log("alice", Utc::now())).await.unwrap();

    let err = delete_workout_log(&pool, "bob", &id).await.unwrap_err();
    assert_eq!(err, StoreError::not_found("Workout log", id.clone()));

    let changes = WorkoutLogChanges {
      notes: Some("Not mine".to_string()),
      ..Default::default()
    };
    let err = update_workout_log(&pool, "bob", &id, &changes).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(matches!(get_workout_log(&pool, "bob", &id).await, Err(StoreError::NotFound { .. })));

    let log = get_workout_log(&pool, "alice", &id).await.expect("Owner still sees the log");
    assert_eq!(log.notes.as_deref(), Some("Felt steady"));
    assert_eq!(fetch_by_user(&pool, "alice").await.unwrap().len(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_loose_ratings_do_not_break_fetch() {
    let pool = setup_test_db().await;
    let now = to_db_timestamp(&Utc::now());
    sqlx::query(
      "INSERT INTO workout_logs (id, user_id, date, exercises_json, created_at, updated_at) VALUES ('loose', 'user-1', ?1, ?2, ?1, ?1)",
    )
    .bind(&now)
    .bind(r#"[{"exercise_id": "ex-1", "exercise_name": "Arm circles", "difficulty": "3", "pain_level": 11.5}]"#)
    .execute(&pool)
    .await
    .unwrap();

    let logs = fetch_by_user(&pool, "user-1").await.expect("Loose ratings should still load");
    assert_eq!(logs[0].exercises[0].difficulty, Some(3));
    assert_eq!(logs[0].exercises[0].pain_level, None);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_malformed_exercise_document_is_reported() {
    let pool = setup_test_db().await;
    let now = to_db_timestamp(&Utc::now());
    sqlx::query(
      "INSERT INTO workout_logs (id, user_id, date, exercises_json, created_at, updated_at) VALUES ('bad', 'user-1', ?1, 'not json', ?1, ?1)",
    )
    .bind(&now)
    .execute(&pool)
    .await
    .unwrap();

    let err = fetch_by_user(&pool, "user-1").await.unwrap_err();
    assert!(matches!(err, StoreError::Document(_)));

    teardown_test_db(pool).await;
  }
}
