//! Exercise catalog persistence, filtering and bulk import

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{parse_db_timestamp, to_db_timestamp, StoreError};
use crate::models::{Difficulty, Exercise, ExerciseFilter, MobilityType, NewExercise};

/// Catalog shipped with the binary, used to populate an empty database
const STARTER_CATALOG: &str = include_str!("../data/starter_exercises.json");

/// Values that mean "nothing" in imported list columns
const EMPTY_LIST_MARKERS: [&str; 3] = ["none", "body only", "n/a"];

const SELECT_COLUMNS: &str = r#"
  SELECT id, name, description, benefits, mobility_types_json, difficulty,
         equipment_json, modifications, target_areas_json, exercise_type,
         image_url, video_url, created_at
  FROM exercises
"#;

fn row_to_exercise(row: &SqliteRow) -> Result<Exercise, StoreError> {
  let mobility_json: String = row.get("mobility_types_json");
  let equipment_json: String = row.get("equipment_json");
  let target_json: String = row.get("target_areas_json");
  let difficulty: Option<String> = row.get("difficulty");

  Ok(Exercise {
    id: row.get("id"),
    name: row.get("name"),
    description: row.get("description"),
    benefits: row.get("benefits"),
    mobility_types: serde_json::from_str(&mobility_json)?,
    difficulty: difficulty.and_then(|d| d.parse().ok()),
    equipment: serde_json::from_str(&equipment_json)?,
    modifications: row.get("modifications"),
    target_areas: serde_json::from_str(&target_json)?,
    exercise_type: row.get("exercise_type"),
    image_url: row.get("image_url"),
    video_url: row.get("video_url"),
    created_at: parse_db_timestamp(row.get("created_at")),
  })
}

async fn insert_exercise(
  conn: &mut SqliteConnection,
  id: &str,
  exercise: &NewExercise,
) -> Result<(), StoreError> {
  sqlx::query(
    r#"
    INSERT INTO exercises (
      id, name, description, benefits, mobility_types_json, difficulty,
      equipment_json, modifications, target_areas_json, exercise_type,
      image_url, video_url, created_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    "#,
  )
  .bind(id)
  .bind(&exercise.name)
  .bind(&exercise.description)
  .bind(&exercise.benefits)
  .bind(serde_json::to_string(&exercise.mobility_types)?)
  .bind(exercise.difficulty.map(|d| d.as_str()))
  .bind(serde_json::to_string(&exercise.equipment)?)
  .bind(&exercise.modifications)
  .bind(serde_json::to_string(&exercise.target_areas)?)
  .bind(&exercise.exercise_type)
  .bind(&exercise.image_url)
  .bind(&exercise.video_url)
  .bind(to_db_timestamp(&Utc::now()))
  .execute(&mut *conn)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// CRUD
/// ---------------------------------------------------------------------------

pub async fn add_exercise(pool: &SqlitePool, exercise: &NewExercise) -> Result<String, StoreError> {
  let id = Uuid::new_v4().to_string();
  let mut conn = pool.acquire().await?;
  insert_exercise(&mut *conn, &id, exercise).await?;

  info!(exercise_id = %id, name = %exercise.name, "Added exercise");
  Ok(id)
}

/// Replace every editable field of an existing entry
pub async fn update_exercise(
  pool: &SqlitePool,
  id: &str,
  exercise: &NewExercise,
) -> Result<Exercise, StoreError> {
  let result = sqlx::query(
    r#"
    UPDATE exercises
    SET name = ?1,
        description = ?2,
        benefits = ?3,
        mobility_types_json = ?4,
        difficulty = ?5,
        equipment_json = ?6,
        modifications = ?7,
        target_areas_json = ?8,
        exercise_type = ?9,
        image_url = ?10,
        video_url = ?11
    WHERE id = ?12
    "#,
  )
  .bind(&exercise.name)
  .bind(&exercise.description)
  .bind(&exercise.benefits)
  .bind(serde_json::to_string(&exercise.mobility_types)?)
  .bind(exercise.difficulty.map(|d| d.as_str()))
  .bind(serde_json::to_string(&exercise.equipment)?)
  .bind(&exercise.modifications)
  .bind(serde_json::to_string(&exercise.target_areas)?)
  .bind(&exercise.exercise_type)
  .bind(&exercise.image_url)
  .bind(&exercise.video_url)
  .bind(id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(StoreError::not_found("Exercise", id));
  }

  info!(exercise_id = %id, "Updated exercise");
  get_exercise(pool, id).await
}

pub async fn delete_exercise(pool: &SqlitePool, id: &str) -> Result<(), StoreError> {
  let result = sqlx::query("DELETE FROM exercises WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(StoreError::not_found("Exercise", id));
  }

  info!(exercise_id = %id, "Deleted exercise");
  Ok(())
}

pub async fn get_exercise(pool: &SqlitePool, id: &str) -> Result<Exercise, StoreError> {
  let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("Exercise", id))?;

  row_to_exercise(&row)
}

/// Entries matching `filter`, ordered by name. Difficulty narrows the query;
/// the remaining predicates are applied to the loaded rows.
pub async fn list_exercises(
  pool: &SqlitePool,
  filter: &ExerciseFilter,
) -> Result<Vec<Exercise>, StoreError> {
  let rows = sqlx::query(&format!(
    "{} WHERE (?1 IS NULL OR difficulty = ?1) ORDER BY name COLLATE NOCASE, id",
    SELECT_COLUMNS
  ))
  .bind(filter.difficulty.map(|d| d.as_str()))
  .fetch_all(pool)
  .await?;

  let mut exercises = Vec::with_capacity(rows.len());
  for row in &rows {
    let exercise = row_to_exercise(row)?;
    if filter.matches(&exercise) {
      exercises.push(exercise);
    }
  }

  debug!(total = rows.len(), matched = exercises.len(), "Listed exercises");
  Ok(exercises)
}

pub async fn count_exercises(pool: &SqlitePool) -> Result<i64, StoreError> {
  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
    .fetch_one(pool)
    .await?;
  Ok(count)
}

/// ---------------------------------------------------------------------------
/// Seeding
/// ---------------------------------------------------------------------------

pub fn starter_catalog() -> Result<Vec<NewExercise>, StoreError> {
  Ok(serde_json::from_str(STARTER_CATALOG)?)
}

/// Populate the catalog from the embedded starter set when it has no
/// entries. Returns how many were inserted.
pub async fn seed_if_empty(pool: &SqlitePool) -> Result<usize, StoreError> {
  if count_exercises(pool).await? > 0 {
    debug!("Catalog already populated, skipping seed");
    return Ok(0);
  }

  let starters = starter_catalog()?;
  let mut tx = pool.begin().await?;
  for exercise in &starters {
    insert_exercise(&mut *tx, &Uuid::new_v4().to_string(), exercise).await?;
  }
  tx.commit().await?;

  info!(count = starters.len(), "Seeded starter catalog");
  Ok(starters.len())
}

/// ---------------------------------------------------------------------------
/// Import
/// ---------------------------------------------------------------------------

/// One row of an external exercise dataset. Column names of the source
/// spreadsheet are accepted alongside the catalog's own names; every field
/// is optional and unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRecord {
  #[serde(default, alias = "Title")]
  pub name: Option<String>,
  #[serde(default, alias = "Desc")]
  pub description: Option<String>,
  #[serde(default, alias = "Type", alias = "type")]
  pub exercise_type: Option<String>,
  #[serde(default, alias = "BodyPart", alias = "targetAreas")]
  pub target_areas: Option<String>,
  #[serde(default, alias = "Equipment")]
  pub equipment: Option<String>,
  #[serde(default, alias = "Level")]
  pub difficulty: Option<String>,
  #[serde(default, alias = "mobilityTypes")]
  pub mobility_types: Option<String>,
  #[serde(default)]
  pub benefits: Option<String>,
  #[serde(default)]
  pub modifications: Option<String>,
  #[serde(default, alias = "imageUrl")]
  pub image_url: Option<String>,
  #[serde(default, alias = "videoUrl")]
  pub video_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub deleted: u64,
  pub inserted: u64,
  pub skipped: u64,
}

/// Comma separated text to a trimmed list; marker values mean empty
pub fn text_to_list(value: Option<&str>) -> Vec<String> {
  let Some(value) = value else {
    return Vec::new();
  };
  if EMPTY_LIST_MARKERS.contains(&value.trim().to_lowercase().as_str()) {
    return Vec::new();
  }
  value
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::to_string)
    .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CatalogRecord {
  /// Normalised entry, or `None` when the record has no name
  pub fn normalize(self) -> Option<NewExercise> {
    let name = non_blank(self.name)?;

    let difficulty = non_blank(self.difficulty).and_then(|d| d.to_lowercase().parse::<Difficulty>().ok());
    let mobility_types = text_to_list(self.mobility_types.as_deref())
      .iter()
      .filter_map(|m| m.parse::<MobilityType>().ok())
      .collect();

    Some(NewExercise {
      name,
      description: non_blank(self.description).unwrap_or_default(),
      benefits: non_blank(self.benefits).unwrap_or_default(),
      mobility_types,
      difficulty,
      equipment: text_to_list(self.equipment.as_deref()),
      modifications: non_blank(self.modifications).unwrap_or_default(),
      target_areas: text_to_list(self.target_areas.as_deref()),
      exercise_type: non_blank(self.exercise_type).map(|t| t.to_lowercase()),
      image_url: non_blank(self.image_url),
      video_url: non_blank(self.video_url).unwrap_or_default(),
    })
  }
}

/// Replace the whole catalog with `records` in one transaction
pub async fn import_catalog(
  pool: &SqlitePool,
  records: Vec<CatalogRecord>,
) -> Result<ImportReport, StoreError> {
  let total = records.len() as u64;
  let exercises: Vec<NewExercise> = records.into_iter().filter_map(CatalogRecord::normalize).collect();
  let skipped = total - exercises.len() as u64;
  if skipped > 0 {
    warn!(skipped, "Skipping catalog records without a name");
  }

  let mut tx = pool.begin().await?;

  let deleted = sqlx::query("DELETE FROM exercises")
    .execute(&mut *tx)
    .await?
    .rows_affected();

  for exercise in &exercises {
    insert_exercise(&mut *tx, &Uuid::new_v4().to_string(), exercise).await?;
  }

  tx.commit().await?;

  let report = ImportReport {
    deleted,
    inserted: exercises.len() as u64,
    skipped,
  };
  info!(
    deleted = report.deleted,
    inserted = report.inserted,
    skipped = report.skipped,
    "Imported exercise catalog"
  );
  Ok(report)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
