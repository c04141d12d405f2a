//! The session being edited before it is saved
//!
//! Every transition consumes or borrows the draft and returns a new one;
//! nothing is patched in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ExerciseLog, NewWorkoutLog, OverallFeeling};

#[derive(Error, Debug, PartialEq)]
pub enum DraftError {
  #[error("A signed-in user is required to save a workout")]
  MissingUser,
}

/// Header fields that can be replaced together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftDetails {
  pub date: Option<DateTime<Utc>>,
  pub notes: Option<String>,
  pub overall_feeling: Option<OverallFeeling>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDraft {
  pub date: DateTime<Utc>,
  pub exercises: Vec<ExerciseLog>,
  pub notes: String,
  pub overall_feeling: OverallFeeling,
}

impl Default for WorkoutDraft {
  fn default() -> Self {
    Self::new()
  }
}

impl WorkoutDraft {
  pub fn new() -> Self {
    Self {
      date: Utc::now(),
      exercises: Vec::new(),
      notes: String::new(),
      overall_feeling: OverallFeeling::Good,
    }
  }

  pub fn with_details(self, details: DraftDetails) -> Self {
    Self {
      date: details.date.unwrap_or(self.date),
      notes: details.notes.unwrap_or(self.notes),
      overall_feeling: details.overall_feeling.unwrap_or(self.overall_feeling),
      ..self
    }
  }

  pub fn with_exercise(mut self, exercise: ExerciseLog) -> Self {
    self.exercises.push(exercise);
    self
  }

  /// Replace the entry at `index`; out of range leaves the draft unchanged
  pub fn with_exercise_updated(mut self, index: usize, exercise: ExerciseLog) -> Self {
    if let Some(slot) = self.exercises.get_mut(index) {
      *slot = exercise;
    }
    self
  }

  /// Drop every entry for `exercise_id`
  pub fn without_exercise(mut self, exercise_id: &str) -> Self {
    self.exercises.retain(|e| e.exercise_id != exercise_id);
    self
  }

  pub fn is_empty(&self) -> bool {
    self.exercises.is_empty()
  }

  pub fn into_new_log(self, user_id: Option<&str>) -> Result<NewWorkoutLog, DraftError> {
    let user_id = user_id
      .map(str::trim)
      .filter(|u| !u.is_empty())
      .ok_or(DraftError::MissingUser)?;

    Ok(NewWorkoutLog {
      id: None,
      user_id: user_id.to_string(),
      date: self.date,
      exercises: self.exercises,
      notes: Some(self.notes).filter(|n| !n.trim().is_empty()),
      overall_feeling: self.overall_feeling,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_new_draft_defaults() {
    let draft = WorkoutDraft::new();
    assert!(draft.is_empty());
    assert_eq!(draft.overall_feeling, OverallFeeling::Good);
    assert!(draft.notes.is_empty());
  }

  #[test]
  fn test_with_details_replaces_only_given_fields() {
    let date = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let draft = WorkoutDraft::new().with_details(DraftDetails {
      date: Some(date),
      ..Default::default()
    });
    assert_eq!(draft.date, date);
    assert_eq!(draft.overall_feeling, OverallFeeling::Good);

    let draft = draft.with_details(DraftDetails {
      notes: Some("felt loose".into()),
      overall_feeling: Some(OverallFeeling::Great),
      ..Default::default()
    });
    assert_eq!(draft.date, date);
    assert_eq!(draft.notes, "felt loose");
    assert_eq!(draft.overall_feeling, OverallFeeling::Great);
  }

  #[test]
  fn test_exercise_transitions() {
    let draft = WorkoutDraft::new()
      .with_exercise(ExerciseLog::new("a", "Arm circles"))
      .with_exercise(ExerciseLog::new("b", "Band pull"))
      .with_exercise(ExerciseLog::new("a", "Arm circles"));
    assert_eq!(draft.exercises.len(), 3);

    let updated = draft.clone().with_exercise_updated(1, ExerciseLog::new("c", "Chair squat"));
    assert_eq!(updated.exercises[1].exercise_id, "c");

    let unchanged = draft.clone().with_exercise_updated(7, ExerciseLog::new("z", "Zed"));
    assert_eq!(unchanged, draft);

    let trimmed = draft.without_exercise("a");
    assert_eq!(trimmed.exercises.len(), 1);
    assert_eq!(trimmed.exercises[0].exercise_id, "b");
  }

  #[test]
  fn test_into_new_log_requires_user() {
    let draft = WorkoutDraft::new().with_exercise(ExerciseLog::new("a", "Arm circles"));
    assert_eq!(draft.clone().into_new_log(None).unwrap_err(), DraftError::MissingUser);
    assert_eq!(draft.clone().into_new_log(Some("  ")).unwrap_err(), DraftError::MissingUser);

    let log = draft.into_new_log(Some("user-1")).unwrap();
    assert_eq!(log.user_id, "user-1");
    assert!(log.id.is_none());
    assert!(log.notes.is_none());
    assert_eq!(log.exercises.len(), 1);
  }
}
