use super::*;

#[test]
fn room_state_new_is_clean() {
    let rs = RoomState::new(Room::default());
    assert!(rs.clients.is_empty());
    assert!(!rs.dirty);
    assert_eq!(rs.room.name, "main");
}

#[tokio::test]
async fn app_state_starts_with_no_rooms() {
    let state = test_helpers::test_app_state();
    assert!(state.rooms.read().await.is_empty());
    assert!(state.template.is_none());
    assert_eq!(state.config.port, 3000);
}

#[tokio::test]
async fn seed_room_registers_under_its_name() {
    let state = test_helpers::test_app_state();
    test_helpers::seed_room(&state, test_helpers::scenario_room("lab")).await;

    let rooms = state.rooms.read().await;
    let shared = rooms.get("lab").expect("seeded");
    assert_eq!(shared.lock().await.room.roles.len(), 2);
}

#[tokio::test]
async fn clones_share_the_registry() {
    let state = test_helpers::test_app_state();
    let clone = state.clone();
    test_helpers::seed_room(&clone, Room::new("side", 100.0, 100.0)).await;
    assert!(state.rooms.read().await.contains_key("side"));
}
