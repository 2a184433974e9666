//! Room service: registry access, hydration, join/part and broadcast.
//!
//! DESIGN
//! ======
//! Rooms are created on first access and live for the rest of the process.
//! A new room is hydrated from its saved file if one exists, else from the
//! configured template, else it starts empty at the configured bounds. The
//! store is consulted with no lock held; if two requests race to create the
//! same room, the first insert wins and the other hydration is discarded.
//!
//! Broadcasts run while the caller holds the room lock, so every subscriber
//! sees snapshots in commit order.

use std::sync::Arc;

use room::Room;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, ErrorCode, Frame};
use crate::services::persistence::StoreError;
use crate::state::{AppState, RoomState, SharedRoom};

/// Syscall of the snapshot push sent to subscribers after every commit.
pub const SNAPSHOT_SYSCALL: &str = "room:snapshot";

const MAX_ROOM_NAME_LEN: usize = 64;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("invalid room name: {0:?}")]
    InvalidName(String),
    #[error("room storage failed: {0}")]
    Store(#[from] StoreError),
}

impl ErrorCode for RoomError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "E_INVALID_REQUEST",
            Self::Store(_) => "E_STORE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

// =============================================================================
// ACCESS
// =============================================================================

/// Room names double as file names, so keep them to a safe alphabet.
///
/// # Errors
///
/// Returns [`RoomError::InvalidName`] for empty, overlong or unsafe names.
pub fn validate_room_name(name: &str) -> Result<(), RoomError> {
    let ok = !name.is_empty()
        && name.len() <= MAX_ROOM_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok { Ok(()) } else { Err(RoomError::InvalidName(name.to_owned())) }
}

/// Get the live room, creating and hydrating it on first access.
///
/// # Errors
///
/// Returns [`RoomError`] for a bad name or a store failure during hydration.
pub async fn get_room(state: &AppState, name: &str) -> Result<SharedRoom, RoomError> {
    validate_room_name(name)?;

    if let Some(shared) = state.rooms.read().await.get(name) {
        return Ok(shared.clone());
    }

    // Hydrate outside locks; applied only if nobody beat us to it.
    let hydrated = hydrate(state, name).await?;

    let mut rooms = state.rooms.write().await;
    let shared = rooms.entry(name.to_owned()).or_insert_with(|| {
        info!(room = %name, occupants = hydrated.roles.len(), revision = hydrated.revision, "room created");
        Arc::new(Mutex::new(RoomState::new(hydrated)))
    });
    Ok(shared.clone())
}

async fn hydrate(state: &AppState, name: &str) -> Result<Room, RoomError> {
    let config = &state.config;

    let mut room = if let Some(saved) = state.store.load(name).await? {
        saved
    } else if let Some(template) = &state.template {
        let mut room = Room::clone(template);
        room.revision = 0;
        room
    } else {
        Room::new(name, config.room_width, config.room_height)
    };

    room.name = name.to_owned();
    room.collision_radius = config.collision_radius;
    Ok(room)
}

/// Read-only copy of the room.
///
/// # Errors
///
/// Same as [`get_room`].
pub async fn snapshot(state: &AppState, name: &str) -> Result<Room, RoomError> {
    let shared = get_room(state, name).await?;
    let rs = shared.lock().await;
    Ok(rs.room.clone())
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Subscribe a client to the room and return the snapshot it starts from.
///
/// # Errors
///
/// Same as [`get_room`].
pub async fn join(state: &AppState, name: &str, client_id: Uuid, tx: mpsc::Sender<Frame>) -> Result<Room, RoomError> {
    let shared = get_room(state, name).await?;
    let mut rs = shared.lock().await;
    rs.clients.insert(client_id, tx);
    info!(room = %name, %client_id, clients = rs.clients.len(), "client joined room");
    Ok(rs.room.clone())
}

/// Unsubscribe a client. The room itself stays live.
pub async fn part(state: &AppState, name: &str, client_id: Uuid) {
    let Some(shared) = state.rooms.read().await.get(name).cloned() else {
        return;
    };
    let mut rs = shared.lock().await;
    if rs.clients.remove(&client_id).is_some() {
        info!(room = %name, %client_id, remaining = rs.clients.len(), "client left room");
    }
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Snapshot payload as sent on the wire.
#[must_use]
pub fn room_data(room: &Room) -> Data {
    let mut data = Data::new();
    data.insert("room".into(), serde_json::to_value(room).unwrap_or_default());
    data
}

/// Push frame carrying the full room snapshot.
#[must_use]
pub fn snapshot_frame(room: &Room) -> Frame {
    Frame::request(SNAPSHOT_SYSCALL, room_data(room))
        .with_room(room.name.clone())
        .with_from("server")
}

/// Send `frame` to every subscriber. Called with the room lock held.
pub fn broadcast(rs: &RoomState, frame: &Frame) {
    for (client_id, tx) in &rs.clients {
        // Best-effort: a full or closed channel only costs that viewer a frame;
        // it catches up on the next snapshot.
        if let Err(e) = tx.try_send(frame.clone()) {
            warn!(%client_id, syscall = %frame.syscall, error = %e, "broadcast dropped");
        }
    }
}

/// Finish a commit: mark for persistence when changed, then push the
/// resulting snapshot to every subscriber.
pub fn publish(rs: &mut RoomState, changed: bool) {
    if changed {
        rs.dirty = true;
    }
    broadcast(rs, &snapshot_frame(&rs.room));
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
