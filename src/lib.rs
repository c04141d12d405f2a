pub mod catalog;
pub mod chat;
pub mod commands;
pub mod config;
pub mod db;
pub mod draft;
pub mod favorites;
pub mod feedback;
pub mod models;
pub mod profile;
pub mod progress;
pub mod workout_log;

#[cfg(test)]
mod test_utils;

use config::AppConfig;
use db::{AppState, StoreError};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "mobility_coach=info".into()))
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}

/// Open the database and build the shared state
pub async fn bootstrap(config: AppConfig) -> Result<Arc<AppState>, StoreError> {
  let pool = db::initialize_db(&config).await?;
  let state = Arc::new(AppState::new(pool, config));
  info!("Database ready");
  Ok(state)
}
