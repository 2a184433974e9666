//! Persistence service: room files and the background flush.
//!
//! DESIGN
//! ======
//! Rooms are stored one JSON document per room (`<dir>/<name>.json`), written
//! through the [`RoomStore`] trait so tests can swap in an in-memory store.
//! Commits only set a dirty flag; a background task wakes every
//! `persist_interval`, snapshots dirty rooms under their lock, and writes them
//! with no lock held.
//!
//! ERROR HANDLING
//! ==============
//! The dirty flag is cleared when the snapshot is taken and restored if the
//! write fails, so the next tick retries. A room that changes again while a
//! write is in flight is simply dirty again. Repeated writes are acceptable,
//! silent loss is not.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use room::Room;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::state::AppState;

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("room file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("room file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable home for room documents.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Load a saved room. `Ok(None)` when nothing was saved under `name`.
    async fn load(&self, name: &str) -> Result<Option<Room>, StoreError>;

    /// Write `room` under its own name, replacing any earlier copy.
    async fn save(&self, room: &Room) -> Result<(), StoreError>;
}

/// One pretty-printed JSON file per room.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl RoomStore for JsonFileStore {
    async fn load(&self, name: &str) -> Result<Option<Room>, StoreError> {
        read_room_file(&self.path_for(name)).await
    }

    async fn save(&self, room: &Room) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(&room.to_persisted())?;

        // Atomic replace via rename.
        let path = self.path_for(&room.name);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(room = %room.name, path = %path.display(), "room file written");
        Ok(())
    }
}

/// Read a room document. A missing file is `Ok(None)`.
///
/// # Errors
///
/// Returns a [`StoreError`] for unreadable or malformed files.
pub async fn read_room_file(path: &Path) -> Result<Option<Room>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(Room::from_json(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// BACKGROUND FLUSH
// =============================================================================

/// Spawn the background persistence task. Returns a handle for shutdown.
pub fn spawn_persistence_task(state: AppState) -> JoinHandle<()> {
    let interval = state.config.persist_interval;
    info!(?interval, "room persistence flush configured");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            flush_all_dirty(&state).await;
        }
    })
}

/// Write every dirty room once. Returns how many rooms were written.
pub async fn flush_all_dirty(state: &AppState) -> usize {
    // PHASE: SNAPSHOT DIRTY ROOMS
    // Clone under each room's lock, then write with no lock held.
    let shared_rooms: Vec<_> = state.rooms.read().await.values().cloned().collect();
    let mut batch = Vec::new();
    for shared in shared_rooms {
        let mut rs = shared.lock().await;
        if rs.dirty {
            rs.dirty = false;
            batch.push((shared.clone(), rs.room.clone()));
        }
    }

    // PHASE: WRITE + RESTORE DIRTY ON FAILURE
    let mut written = 0;
    for (shared, snapshot) in batch {
        match state.store.save(&snapshot).await {
            Ok(()) => written += 1,
            Err(e) => {
                error!(error = %e, room = %snapshot.name, "room flush failed; will retry");
                shared.lock().await.dirty = true;
            }
        }
    }
    written
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
