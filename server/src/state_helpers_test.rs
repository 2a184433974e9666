use super::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use room::layout::{Furniture, Layout, Wall};
use room::{OccupantKind, OccupantUpdate};

use crate::services::persistence::StoreError;

/// In-memory `RoomStore`. `fail_saves` makes every save return an error.
#[derive(Default)]
pub struct MemoryStore {
    pub rooms: std::sync::Mutex<HashMap<String, Room>>,
    pub fail_saves: AtomicBool,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    pub fn saved(&self, name: &str) -> Option<Room> {
        self.rooms.lock().expect("store mutex").get(name).cloned()
    }
}

#[async_trait::async_trait]
impl RoomStore for MemoryStore {
    async fn load(&self, name: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.saved(name))
    }

    async fn save(&self, room: &Room) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.rooms
            .lock()
            .expect("store mutex")
            .insert(room.name.clone(), room.clone());
        Ok(())
    }
}

/// `AppState` backed by a fresh `MemoryStore` and no template.
#[must_use]
pub fn test_app_state() -> AppState {
    test_app_state_with_store(Arc::new(MemoryStore::default()))
}

#[must_use]
pub fn test_app_state_with_store(store: Arc<MemoryStore>) -> AppState {
    AppState::new(ServerConfig::default(), store, None)
}

/// 800x600 room with a wall at x=200, a table at (500,300) 100x60, and
/// "Bot" (autonomous) at (100,100) plus "user" at (700,500).
#[must_use]
pub fn scenario_room(name: &str) -> Room {
    let layout = Layout {
        walls: vec![Wall { id: 1, x1: 200.0, y1: 0.0, x2: 200.0, y2: 600.0, thickness: 4.0, is_outer: false }],
        furniture: vec![Furniture {
            id: 1,
            name: "Table".into(),
            kind: "table".into(),
            x: 500.0,
            y: 300.0,
            width: 100.0,
            height: 60.0,
            color: "#8B4513".into(),
            description: None,
        }],
        ..Layout::default()
    };
    let mut room = Room::new(name, 800.0, 600.0).with_layout(layout);
    room.set_occupant(OccupantUpdate::at("Bot", 100.0, 100.0));
    room.set_occupant(OccupantUpdate::at("user", 700.0, 500.0).with_kind(OccupantKind::User));
    room
}

/// Insert `room` into the registry as if it had been hydrated.
pub async fn seed_room(state: &AppState, room: Room) -> SharedRoom {
    let shared = Arc::new(Mutex::new(RoomState::new(room)));
    let name = shared.lock().await.room.name.clone();
    state.rooms.write().await.insert(name, shared.clone());
    shared
}

/// Subscribe a fake viewer to `name` and return its receiver.
pub async fn subscribe(state: &AppState, name: &str) -> (Uuid, mpsc::Receiver<Frame>) {
    let client_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(32);
    let shared = state.rooms.read().await.get(name).cloned().expect("room seeded");
    shared.lock().await.clients.insert(client_id, tx);
    (client_id, rx)
}
