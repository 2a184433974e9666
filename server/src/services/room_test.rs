use super::*;
use std::sync::Arc;

use room::{OccupantKind, OccupantUpdate};
use tokio::time::{Duration, timeout};

use crate::config::ServerConfig;
use crate::services::persistence::RoomStore;
use crate::state::test_helpers::{self, MemoryStore};

#[test]
fn room_names_are_validated() {
    assert!(validate_room_name("main").is_ok());
    assert!(validate_room_name("lab_2-b").is_ok());
    assert!(validate_room_name("").is_err());
    assert!(validate_room_name("../etc").is_err());
    assert!(validate_room_name("a b").is_err());
    assert!(validate_room_name(&"x".repeat(65)).is_err());
}

#[test]
fn error_codes() {
    assert_eq!(RoomError::InvalidName("..".into()).error_code(), "E_INVALID_REQUEST");
    let store = RoomError::Store(StoreError::Io(std::io::Error::other("boom")));
    assert_eq!(store.error_code(), "E_STORE");
    assert!(store.retryable());
}

#[tokio::test]
async fn first_access_creates_default_room() {
    let state = test_helpers::test_app_state();
    let room = snapshot(&state, "main").await.expect("room");
    assert_eq!(room.name, "main");
    assert!((room.width - 800.0).abs() < f64::EPSILON);
    assert!(room.roles.is_empty());
    assert!(room.layout.walls.is_empty());
}

#[tokio::test]
async fn get_room_returns_the_same_instance() {
    let state = test_helpers::test_app_state();
    let a = get_room(&state, "main").await.expect("room");
    let b = get_room(&state, "main").await.expect("room");
    assert!(Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn saved_room_wins_over_template() {
    let store = Arc::new(MemoryStore::default());
    let mut saved = test_helpers::scenario_room("lab");
    saved.revision = 7;
    store.save(&saved).await.expect("save");

    let template = Room::new("template", 1000.0, 700.0);
    let state = AppState::new(ServerConfig::default(), store, Some(template));

    let room = snapshot(&state, "lab").await.expect("room");
    assert_eq!(room.revision, 7);
    assert_eq!(room.roles.len(), 2);
    assert!((room.width - 800.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn template_is_renamed_for_new_rooms() {
    let mut template = test_helpers::scenario_room("template");
    template.revision = 12;
    let state = AppState::new(ServerConfig::default(), Arc::new(MemoryStore::default()), Some(template));

    let room = snapshot(&state, "office").await.expect("room");
    assert_eq!(room.name, "office");
    assert_eq!(room.revision, 0);
    assert_eq!(room.layout.walls.len(), 1);
}

#[tokio::test]
async fn configured_radius_applies_to_hydrated_rooms() {
    let config = ServerConfig { collision_radius: 35.0, ..ServerConfig::default() };
    let state = AppState::new(config, Arc::new(MemoryStore::default()), None);
    let room = snapshot(&state, "main").await.expect("room");
    assert!((room.collision_radius - 35.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn invalid_name_is_rejected_before_hydration() {
    let state = test_helpers::test_app_state();
    assert!(matches!(get_room(&state, "../x").await, Err(RoomError::InvalidName(_))));
    assert!(state.rooms.read().await.is_empty());
}

#[tokio::test]
async fn join_subscribes_and_part_unsubscribes() {
    let state = test_helpers::test_app_state();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(4);

    let room = join(&state, "main", client_id, tx).await.expect("join");
    assert_eq!(room.name, "main");

    let shared = get_room(&state, "main").await.expect("room");
    assert!(shared.lock().await.clients.contains_key(&client_id));

    part(&state, "main", client_id).await;
    assert!(shared.lock().await.clients.is_empty());
    assert!(state.rooms.read().await.contains_key("main"), "rooms outlive their viewers");
}

#[tokio::test]
async fn publish_sends_snapshot_and_marks_dirty() {
    let state = test_helpers::test_app_state();
    let shared = test_helpers::seed_room(&state, test_helpers::scenario_room("lab")).await;
    let (_id, mut rx) = test_helpers::subscribe(&state, "lab").await;

    {
        let mut rs = shared.lock().await;
        rs.room.set_occupant(OccupantUpdate::at("Bot2", 700.0, 100.0).with_kind(OccupantKind::Autonomous));
        publish(&mut rs, true);
        assert!(rs.dirty);
    }

    let frame = timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("snapshot timed out")
        .expect("channel open");
    assert_eq!(frame.syscall, SNAPSHOT_SYSCALL);
    assert_eq!(frame.room.as_deref(), Some("lab"));
    assert!(frame.parent_id.is_none());
    let roles = frame.data["room"]["roles"].as_array().expect("roles");
    assert_eq!(roles.len(), 3);
}

#[tokio::test]
async fn broadcast_survives_closed_subscriber() {
    let state = test_helpers::test_app_state();
    let shared = test_helpers::seed_room(&state, Room::new("lab", 100.0, 100.0)).await;
    let (_a, rx_a) = test_helpers::subscribe(&state, "lab").await;
    let (_b, mut rx_b) = test_helpers::subscribe(&state, "lab").await;
    drop(rx_a);

    publish(&mut *shared.lock().await, false);
    assert!(!shared.lock().await.dirty);

    let frame = timeout(Duration::from_millis(200), rx_b.recv())
        .await
        .expect("snapshot timed out")
        .expect("channel open");
    assert_eq!(frame.syscall, SNAPSHOT_SYSCALL);
}
