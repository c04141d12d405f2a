//! Favorites commands for the signed-in user's session

use std::time::Duration;

use tracing::{debug, warn};

use crate::catalog;
use crate::db::{AppState, StoreError};
use crate::favorites::FavoritesSnapshot;
use crate::models::Exercise;

/// How long `load_favorites` waits for the first stored value
const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Start syncing `user_id`'s favorites and return the first loaded snapshot
pub async fn load_favorites(state: &AppState, user_id: String) -> Result<FavoritesSnapshot, String> {
  let mut rx = {
    let mut favorites = state.favorites.lock().await;
    favorites.load(&user_id);
    favorites.watch()
  };

  let loaded = tokio::time::timeout(LOAD_TIMEOUT, rx.wait_for(|s| !s.loading))
    .await
    .map(|waited| waited.map(|snapshot| snapshot.clone()));

  match loaded {
    Ok(Ok(snapshot)) => Ok(snapshot),
    Ok(Err(e)) => Err(format!("Favorites channel closed: {}", e)),
    Err(_) => {
      warn!(user_id = %user_id, "Timed out waiting for favorites");
      Ok(rx.borrow().clone())
    }
  }
}

pub async fn get_favorites(state: &AppState) -> Result<FavoritesSnapshot, String> {
  Ok(state.favorites.lock().await.snapshot())
}

/// Flip one exercise in or out of the user's favorites
pub async fn toggle_favorite(
  state: &AppState,
  user_id: String,
  exercise_id: String,
) -> Result<Vec<String>, String> {
  let favorites = state.favorites.lock().await;
  favorites
    .toggle(&user_id, &exercise_id)
    .await
    .map_err(|e| format!("Failed to update favorites: {}", e))
}

pub async fn clear_favorites(state: &AppState) -> Result<(), String> {
  state.favorites.lock().await.clear();
  Ok(())
}

/// Catalog entries for the current favorites, in favorite order. Ids that
/// no longer exist in the catalog are skipped.
pub async fn get_favorite_exercises(state: &AppState) -> Result<Vec<Exercise>, String> {
  let ids = state.favorites.lock().await.snapshot().favorite_ids;

  let mut exercises = Vec::with_capacity(ids.len());
  for id in &ids {
    match catalog::get_exercise(&state.db, id).await {
      Ok(exercise) => exercises.push(exercise),
      Err(StoreError::NotFound { .. }) => debug!(exercise_id = %id, "Favorite no longer in catalog"),
      Err(e) => return Err(format!("Failed to load favorite exercises: {}", e)),
    }
  }
  Ok(exercises)
}
