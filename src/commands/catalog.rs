//! Exercise library commands

use tracing::info;

use crate::catalog::{self, CatalogRecord, ImportReport};
use crate::db::AppState;
use crate::models::{Exercise, ExerciseFilter, NewExercise};

pub async fn list_exercises(state: &AppState, filter: ExerciseFilter) -> Result<Vec<Exercise>, String> {
  catalog::list_exercises(&state.db, &filter)
    .await
    .map_err(|e| format!("Failed to load exercises: {}", e))
}

pub async fn get_exercise(state: &AppState, id: String) -> Result<Exercise, String> {
  catalog::get_exercise(&state.db, &id)
    .await
    .map_err(|e| format!("Failed to load exercise: {}", e))
}

pub async fn add_exercise(state: &AppState, exercise: NewExercise) -> Result<String, String> {
  if exercise.name.trim().is_empty() {
    return Err("Exercise name is required".to_string());
  }
  catalog::add_exercise(&state.db, &exercise)
    .await
    .map_err(|e| format!("Failed to add exercise: {}", e))
}

pub async fn update_exercise(state: &AppState, id: String, exercise: NewExercise) -> Result<Exercise, String> {
  catalog::update_exercise(&state.db, &id, &exercise)
    .await
    .map_err(|e| format!("Failed to update exercise: {}", e))
}

pub async fn delete_exercise(state: &AppState, id: String) -> Result<(), String> {
  catalog::delete_exercise(&state.db, &id)
    .await
    .map_err(|e| format!("Failed to delete exercise: {}", e))
}

/// Populate an empty catalog with the starter set
pub async fn seed_exercises(state: &AppState) -> Result<usize, String> {
  catalog::seed_if_empty(&state.db)
    .await
    .map_err(|e| format!("Failed to seed exercises: {}", e))
}

/// Replace the catalog with an external dataset
pub async fn import_exercises(state: &AppState, records: Vec<CatalogRecord>) -> Result<ImportReport, String> {
  let report = catalog::import_catalog(&state.db, records)
    .await
    .map_err(|e| format!("Failed to import exercises: {}", e))?;
  info!(
    "Successfully cleared {} docs and seeded {} new, validated exercises",
    report.deleted, report.inserted
  );
  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Difficulty, MobilityType};
  use crate::test_utils::*;

  #[tokio::test]
  async fn test_seed_then_filter() {
    let state = setup_test_state().await;
    let seeded = seed_exercises(&state).await.unwrap();
    assert!(seeded > 0);

    let hard = list_exercises(
      &state,
      ExerciseFilter {
        difficulty: Some(Difficulty::Hard),
        ..Default::default()
      },
    )
    .await
    .unwrap();
    assert!(hard.iter().all(|e| e.difficulty == Some(Difficulty::Hard)));

    let one = get_exercise(&state, hard[0].id.clone()).await.unwrap();
    assert_eq!(one, hard[0]);
  }

  #[tokio::test]
  async fn test_add_requires_name() {
    let state = setup_test_state().await;
    let mut exercise = create_mock_exercise("Band Pull", Difficulty::Easy, &[MobilityType::Seated]);

    exercise.name = "  ".into();
    assert_eq!(add_exercise(&state, exercise.clone()).await.unwrap_err(), "Exercise name is required");

    exercise.name = "Band Pull".into();
    let id = add_exercise(&state, exercise.clone()).await.unwrap();
    exercise.benefits = "Posture".into();
    assert_eq!(update_exercise(&state, id.clone(), exercise).await.unwrap().benefits, "Posture");
    delete_exercise(&state, id.clone()).await.unwrap();
    assert!(get_exercise(&state, id).await.unwrap_err().contains("not found"));
  }

  #[tokio::test]
  async fn test_import_reports_counts() {
    let state = setup_test_state().await;
    let records: Vec<CatalogRecord> = serde_json::from_str(
      r#"[
        {"Title": "Shoulder Rolls", "Type": "Stretching", "BodyPart": "Shoulders", "Equipment": "None", "Level": "Beginner"},
        {"Desc": "no title here"}
      ]"#,
    )
    .unwrap();

    let report = import_exercises(&state, records).await.unwrap();
    assert_eq!(report, ImportReport { deleted: 0, inserted: 1, skipped: 1 });
  }
}
