//! Feedback on chat recommendations

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;

use crate::db::{from_db_timestamp, to_db_timestamp, StoreError};
use crate::models::{Feedback, FeedbackKind, FeedbackValue, StoredFeedback};

#[derive(Error, Debug, PartialEq)]
pub enum FeedbackError {
  #[error("'{}' is not a {} answer", .value.as_str(), .kind.as_str())]
  Mismatch { kind: FeedbackKind, value: FeedbackValue },

  #[error(transparent)]
  Store(#[from] StoreError),
}

impl Feedback {
  pub fn validate(&self) -> Result<(), FeedbackError> {
    if self.value.kind() != self.kind {
      return Err(FeedbackError::Mismatch {
        kind: self.kind,
        value: self.value,
      });
    }
    Ok(())
  }
}

/// Record a reaction, returning its id
pub async fn submit_feedback(pool: &SqlitePool, feedback: &Feedback) -> Result<i64, FeedbackError> {
  feedback.validate()?;

  let result = sqlx::query(
    r#"
    INSERT INTO feedback (user_id, exercise_name, recommendation_text, kind, value, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
  )
  .bind(&feedback.user_id)
  .bind(&feedback.exercise_name)
  .bind(&feedback.recommendation_text)
  .bind(feedback.kind.as_str())
  .bind(feedback.value.as_str())
  .bind(to_db_timestamp(&Utc::now()))
  .execute(pool)
  .await
  .map_err(StoreError::from)?;

  let id = result.last_insert_rowid();
  info!(
    feedback_id = id,
    user_id = %feedback.user_id,
    kind = feedback.kind.as_str(),
    value = feedback.value.as_str(),
    "Recorded feedback"
  );
  Ok(id)
}

/// A user's feedback, newest first
pub async fn list_feedback(pool: &SqlitePool, user_id: &str) -> Result<Vec<StoredFeedback>, StoreError> {
  let rows = sqlx::query(
    r#"
    SELECT id, user_id, exercise_name, recommendation_text, kind, value, created_at
    FROM feedback
    WHERE user_id = ?1
    ORDER BY created_at DESC, id DESC
    "#,
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;

  rows
    .iter()
    .map(|row| -> Result<StoredFeedback, StoreError> {
      let kind: String = row.get("kind");
      let value: String = row.get("value");
      let created_at: String = row.get("created_at");
      Ok(StoredFeedback {
        id: row.get("id"),
        feedback: Feedback {
          user_id: row.get("user_id"),
          exercise_name: row.get("exercise_name"),
          recommendation_text: row.get("recommendation_text"),
          kind: kind.parse().map_err(StoreError::Document)?,
          value: value.parse().map_err(StoreError::Document)?,
        },
        created_at: from_db_timestamp(&created_at)?,
      })
    })
    .collect()
}
