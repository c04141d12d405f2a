use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::AppConfig;
use crate::favorites::{Favorites, FavoritesStore};

pub type DbPool = SqlitePool;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

/// Failure of a store operation. Library errors are flattened to messages so
/// they can cross the command boundary unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(String),

  #[error("Migration failed: {0}")]
  Migration(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("Malformed stored document: {0}")]
  Document(String),
}

impl StoreError {
  pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
    Self::NotFound {
      entity,
      id: id.into(),
    }
  }
}

impl From<sqlx::Error> for StoreError {
  fn from(e: sqlx::Error) -> Self {
    Self::Database(e.to_string())
  }
}

impl From<serde_json::Error> for StoreError {
  fn from(e: serde_json::Error) -> Self {
    Self::Document(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Timestamps
/// ---------------------------------------------------------------------------

/// Fixed-width UTC text, so lexical order in SQL equals time order
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_db_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StoreError::Document(format!("bad timestamp '{}': {}", s, e)))
}

/// Lenient variant for bookkeeping columns
pub fn parse_db_timestamp(s: Option<String>) -> Option<DateTime<Utc>> {
  s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
    .map(|dt| dt.with_timezone(&Utc))
}

/// ---------------------------------------------------------------------------
/// Application State
/// ---------------------------------------------------------------------------

/// Shared state handed to every command
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
  /// Favorites of the signed-in user, kept in sync with the store
  pub favorites: Mutex<Favorites>,
}

impl AppState {
  pub fn new(db: DbPool, config: AppConfig) -> Self {
    let favorites = Favorites::new(FavoritesStore::new(db.clone()));
    Self {
      db,
      config,
      favorites: Mutex::new(favorites),
    }
  }
}

/// Open the connection pool and run migrations
pub async fn initialize_db(config: &AppConfig) -> Result<DbPool, StoreError> {
  info!(url = %config.database_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect(&config.database_url)
    .await?;

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .map_err(|e| StoreError::Migration(e.to_string()))?;

  info!("Database initialized successfully");

  Ok(pool)
}
