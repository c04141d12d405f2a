//! Favorites sync
//!
//! The store keeps one favorites document per user and broadcasts every
//! successful write. A `Favorites` session mirrors one user's document into
//! a `watch` channel: it applies the stored value on load, then every pushed
//! change, and toggles optimistically with rollback when the write fails.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::db::{to_db_timestamp, StoreError};

/// Pending pushes per subscriber before it falls behind and refetches
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// ---------------------------------------------------------------------------
/// Snapshot & Change Types
/// ---------------------------------------------------------------------------

/// One user's stored favorites at a given revision. Every successful write
/// is broadcast as one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoritesChange {
  pub user_id: String,
  pub exercise_ids: Vec<String>,
  /// Strictly increasing per user; 0 before the first write
  pub revision: i64,
}

impl FavoritesChange {
  fn empty(user_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      exercise_ids: Vec::new(),
      revision: 0,
    }
  }
}

/// What the favorites view renders. Replaced wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoritesSnapshot {
  pub user_id: Option<String>,
  pub favorite_ids: Vec<String>,
  pub loading: bool,
  /// Revision the snapshot reflects. Pushes older than this are dropped.
  #[serde(default)]
  pub revision: i64,
}

impl FavoritesSnapshot {
  pub fn loading_for(user_id: &str) -> Self {
    Self {
      user_id: Some(user_id.to_string()),
      favorite_ids: Vec::new(),
      loading: true,
      revision: 0,
    }
  }

  pub fn contains(&self, exercise_id: &str) -> bool {
    self.favorite_ids.iter().any(|id| id == exercise_id)
  }

  fn belongs_to(&self, user_id: &str) -> bool {
    self.user_id.as_deref() == Some(user_id)
  }
}

/// `ids` with `exercise_id` appended when absent, removed when present
pub fn toggled(ids: &[String], exercise_id: &str) -> Vec<String> {
  if ids.iter().any(|id| id == exercise_id) {
    ids.iter().filter(|id| *id != exercise_id).cloned().collect()
  } else {
    let mut next = ids.to_vec();
    next.push(exercise_id.to_string());
    next
  }
}

/// ---------------------------------------------------------------------------
/// Store
/// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FavoritesStore {
  pool: SqlitePool,
  changes: broadcast::Sender<FavoritesChange>,
}

impl FavoritesStore {
  pub fn new(pool: SqlitePool) -> Self {
    let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
    Self { pool, changes }
  }

  /// Stored favorites of a user; empty when the user has no document yet
  pub async fn fetch(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
    Ok(self.fetch_document(user_id).await?.exercise_ids)
  }

  pub async fn fetch_document(&self, user_id: &str) -> Result<FavoritesChange, StoreError> {
    let mut conn = self.pool.acquire().await?;
    read_document(&mut conn, user_id).await
  }

  /// Overwrite a user's favorites and push the change to subscribers
  pub async fn save(&self, user_id: &str, exercise_ids: &[String]) -> Result<FavoritesChange, StoreError> {
    let mut conn = self.pool.acquire().await?;
    let revision = write_document(&mut conn, user_id, exercise_ids).await?;
    Ok(self.publish(user_id, exercise_ids.to_vec(), revision))
  }

  /// Flip `exercise_id` in the stored document. The read and the write share
  /// one transaction, so a toggle never discards ids written by another.
  pub async fn toggle(&self, user_id: &str, exercise_id: &str) -> Result<FavoritesChange, StoreError> {
    let mut tx = self.pool.begin().await?;
    let current = read_document(&mut tx, user_id).await?;
    let next = toggled(&current.exercise_ids, exercise_id);
    let revision = write_document(&mut tx, user_id, &next).await?;
    tx.commit().await?;

    Ok(self.publish(user_id, next, revision))
  }

  fn publish(&self, user_id: &str, exercise_ids: Vec<String>, revision: i64) -> FavoritesChange {
    debug!(user_id = %user_id, count = exercise_ids.len(), revision, "Saved favorites");

    let change = FavoritesChange {
      user_id: user_id.to_string(),
      exercise_ids,
      revision,
    };
    // No live subscribers is fine
    let _ = self.changes.send(change.clone());
    change
  }

  /// Mirror `user_id`'s document into `sink` until the handle is dropped.
  /// Writes to `sink` are skipped once it belongs to another user.
  pub fn subscribe(
    &self,
    user_id: &str,
    sink: Arc<watch::Sender<FavoritesSnapshot>>,
  ) -> FavoritesSubscription {
    // Attach before the initial fetch so no write slips between the two
    let mut changes = self.changes.subscribe();
    let store = self.clone();
    let user = user_id.to_string();

    let task = tokio::spawn(async move {
      store.refresh(&user, &sink).await;

      loop {
        match changes.recv().await {
          Ok(change) if change.user_id == user => apply(&sink, change),
          Ok(_) => {}
          Err(RecvError::Lagged(missed)) => {
            warn!(user_id = %user, missed, "Favorites listener lagged, refetching");
            store.refresh(&user, &sink).await;
          }
          Err(RecvError::Closed) => break,
        }
      }
    });

    FavoritesSubscription {
      user_id: user_id.to_string(),
      task,
    }
  }

  async fn refresh(&self, user_id: &str, sink: &watch::Sender<FavoritesSnapshot>) {
    match self.fetch_document(user_id).await {
      Ok(document) => apply(sink, document),
      Err(e) => {
        error!(user_id = %user_id, error = %e, "Failed to load favorites");
        sink.send_if_modified(|snapshot| {
          if snapshot.belongs_to(user_id) && snapshot.loading {
            snapshot.loading = false;
            true
          } else {
            false
          }
        });
      }
    }
  }
}

async fn read_document(conn: &mut SqliteConnection, user_id: &str) -> Result<FavoritesChange, StoreError> {
  let row = sqlx::query("SELECT exercise_ids_json, revision FROM favorites WHERE user_id = ?1")
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

  match row {
    Some(row) => {
      let json: String = row.get("exercise_ids_json");
      Ok(FavoritesChange {
        user_id: user_id.to_string(),
        exercise_ids: serde_json::from_str(&json)?,
        revision: row.get("revision"),
      })
    }
    None => Ok(FavoritesChange::empty(user_id)),
  }
}

/// Upsert the document and return its new revision
async fn write_document(
  conn: &mut SqliteConnection,
  user_id: &str,
  exercise_ids: &[String],
) -> Result<i64, StoreError> {
  let row = sqlx::query(
    r#"
    INSERT INTO favorites (user_id, exercise_ids_json, revision, updated_at)
    VALUES (?1, ?2, 1, ?3)
    ON CONFLICT(user_id) DO UPDATE SET
      exercise_ids_json = excluded.exercise_ids_json,
      revision = favorites.revision + 1,
      updated_at = excluded.updated_at
    RETURNING revision
    "#,
  )
  .bind(user_id)
  .bind(serde_json::to_string(exercise_ids)?)
  .bind(to_db_timestamp(&Utc::now()))
  .fetch_one(&mut *conn)
  .await?;

  Ok(row.get("revision"))
}

/// Replace the snapshot with `change` unless it belongs to another user or
/// is older than what the snapshot already shows
fn apply(sink: &watch::Sender<FavoritesSnapshot>, change: FavoritesChange) {
  sink.send_if_modified(|snapshot| {
    if !snapshot.belongs_to(&change.user_id) {
      return false;
    }
    if change.revision < snapshot.revision {
      debug!(user_id = %change.user_id, revision = change.revision, "Dropping stale favorites push");
      return false;
    }
    *snapshot = FavoritesSnapshot {
      user_id: Some(change.user_id),
      favorite_ids: change.exercise_ids,
      loading: false,
      revision: change.revision,
    };
    true
  });
}

/// Live listener for one user's favorites. Dropping it stops the listener.
pub struct FavoritesSubscription {
  user_id: String,
  task: JoinHandle<()>,
}

impl FavoritesSubscription {
  pub fn user_id(&self) -> &str {
    &self.user_id
  }
}

impl Drop for FavoritesSubscription {
  fn drop(&mut self) {
    debug!(user_id = %self.user_id, "Stopping favorites listener");
    self.task.abort();
  }
}

/// ---------------------------------------------------------------------------
/// Session
/// ---------------------------------------------------------------------------

/// Favorites of the signed-in user
pub struct Favorites {
  store: FavoritesStore,
  state: Arc<watch::Sender<FavoritesSnapshot>>,
  subscription: Option<FavoritesSubscription>,
}

impl Favorites {
  pub fn new(store: FavoritesStore) -> Self {
    let (state, _) = watch::channel(FavoritesSnapshot::default());
    Self {
      store,
      state: Arc::new(state),
      subscription: None,
    }
  }

  /// Switch to `user_id`, tearing down the previous listener first
  pub fn load(&mut self, user_id: &str) {
    self.subscription.take();
    self.state.send_replace(FavoritesSnapshot::loading_for(user_id));
    self.subscription = Some(self.store.subscribe(user_id, self.state.clone()));
    info!(user_id = %user_id, "Loading favorites");
  }

  /// Flip `exercise_id` and persist. The local snapshot changes before the
  /// write and is restored if the write fails. Returns the stored list.
  pub async fn toggle(&self, user_id: &str, exercise_id: &str) -> Result<Vec<String>, StoreError> {
    let previous = self.snapshot();
    let is_loaded = previous.belongs_to(user_id);

    // The optimistic revision sits ahead of every push already in flight
    let optimistic = previous.revision + 1;
    if is_loaded {
      self.state.send_if_modified(|snapshot| {
        if !snapshot.belongs_to(user_id) {
          return false;
        }
        snapshot.favorite_ids = toggled(&snapshot.favorite_ids, exercise_id);
        snapshot.revision = snapshot.revision.max(optimistic);
        true
      });
    }

    match self.store.toggle(user_id, exercise_id).await {
      Ok(change) => {
        let stored = change.exercise_ids.clone();
        if is_loaded {
          apply(&self.state, change);
        }
        Ok(stored)
      }
      Err(e) => {
        error!(user_id = %user_id, exercise_id = %exercise_id, error = %e, "Failed to save favorites, rolling back");
        if is_loaded {
          self.state.send_if_modified(|snapshot| {
            // A newer push already replaced the optimistic value
            if !snapshot.belongs_to(user_id) || snapshot.revision != optimistic {
              return false;
            }
            snapshot.favorite_ids = previous.favorite_ids.clone();
            snapshot.revision = previous.revision;
            true
          });
        }
        Err(e)
      }
    }
  }

  /// Sign-out: stop listening and forget the snapshot
  pub fn clear(&mut self) {
    self.subscription.take();
    self.state.send_replace(FavoritesSnapshot::default());
  }

  pub fn snapshot(&self) -> FavoritesSnapshot {
    self.state.borrow().clone()
  }

  pub fn watch(&self) -> watch::Receiver<FavoritesSnapshot> {
    self.state.subscribe()
  }

  pub fn is_favorite(&self, exercise_id: &str) -> bool {
    self.state.borrow().contains(exercise_id)
  }

  pub fn store(&self) -> &FavoritesStore {
    &self.store
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
