//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the room registry, the storage backend and the loaded config.
//!
//! Each live room sits behind its own `tokio::sync::Mutex`. Every mutation
//! validates, commits and broadcasts while holding that one lock, so requests
//! for the same room are serialized and requests for different rooms are not.
//! The outer `RwLock` only guards the registry and is never held across I/O.

use std::collections::HashMap;
use std::sync::Arc;

use room::Room;
use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::frame::Frame;
use crate::services::persistence::RoomStore;

// =============================================================================
// ROOM STATE
// =============================================================================

/// One live room: the authoritative model plus its subscribers.
pub struct RoomState {
    pub room: Room,
    /// Subscribed viewers: `client_id` -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
    /// Changed since the last successful flush.
    pub dirty: bool,
}

impl RoomState {
    #[must_use]
    pub fn new(room: Room) -> Self {
        Self { room, clients: HashMap::new(), dirty: false }
    }
}

pub type SharedRoom = Arc<Mutex<RoomState>>;

// =============================================================================
// APP STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, SharedRoom>>>,
    pub store: Arc<dyn RoomStore>,
    /// Layout (and starting occupants) for rooms with no saved file.
    pub template: Option<Arc<Room>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn RoomStore>, template: Option<Room>) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            store,
            template: template.map(Arc::new),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
