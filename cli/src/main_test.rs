#![allow(clippy::float_cmp)]

use room::OccupantUpdate;

use super::*;

#[test]
fn ws_url_maps_scheme_and_carries_name() {
    assert_eq!(ws_url("http://127.0.0.1:3000", "bob").expect("http"), "ws://127.0.0.1:3000/api/ws?name=bob");
    assert_eq!(ws_url("https://rooms.example/", "bob").expect("https"), "wss://rooms.example/api/ws?name=bob");
    assert!(matches!(ws_url("ftp://x", "bob"), Err(CliError::InvalidBaseUrl(_))));
}

#[test]
fn backoff_doubles_up_to_cap() {
    let mut d = INITIAL_BACKOFF;
    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push(d.as_secs());
        d = next_backoff(d);
    }
    assert_eq!(seen, vec![1, 2, 4, 8, 10, 10]);
}

#[test]
fn pointer_path_ends_on_target() {
    let path = pointer_path(Point::new(0.0, 0.0), Point::new(100.0, 50.0), 4);
    assert_eq!(path.len(), 4);
    assert_eq!(path[0], Point::new(25.0, 12.5));
    assert_eq!(path[3], Point::new(100.0, 50.0));
}

#[test]
fn pointer_path_zero_steps_is_one_jump() {
    let path = pointer_path(Point::new(0.0, 0.0), Point::new(10.0, 10.0), 0);
    assert_eq!(path, vec![Point::new(10.0, 10.0)]);
}

#[test]
fn request_frame_is_a_bare_request() {
    let frame = request_frame("role:clear", "main", "bob", Map::new());
    assert_eq!(frame.status, Status::Request);
    assert!(frame.parent_id.is_none());
    assert_eq!(frame.room.as_deref(), Some("main"));
    assert_eq!(frame.from.as_deref(), Some("bob"));
    assert!(frame.data.as_object().is_some_and(Map::is_empty));
}

#[test]
fn object_builds_map_in_order() {
    let map = object([("role_name", Value::from("Bot")), ("x", Value::from(1.5))]);
    assert_eq!(map.get("role_name").and_then(Value::as_str), Some("Bot"));
    assert_eq!(map.get("x").and_then(Value::as_f64), Some(1.5));
}

#[test]
fn describe_room_lists_occupants() {
    let mut room = Room::new("main", 800.0, 600.0);
    room.set_occupant(OccupantUpdate::at("Bot", 100.0, 100.0).with_avatar("B"));
    assert_eq!(describe_room(&room), "[main r1] BBot@(100, 100)");
}

#[test]
fn notice_finds_first_notify() {
    let actions = vec![Action::RenderNeeded, Action::Notify("blocked".into())];
    assert_eq!(notice(&actions), Some("blocked"));
    assert_eq!(notice(&[Action::RenderNeeded]), None);
}

#[test]
fn placement_move_carries_user_kind() {
    let mut room = Room::new("main", 800.0, 600.0);
    room.set_occupant(OccupantUpdate::at("Bot", 100.0, 100.0));
    let mut core = EngineCore::new().with_viewer("alice");
    core.load_snapshot(room);

    let actions = core.on_click(Point::new(700.0, 100.0));
    let Some(Action::SubmitMove(cmd)) = actions.first() else {
        panic!("expected a move, got {actions:?}");
    };
    let data = move_data(cmd);
    assert_eq!(data.get("role_name"), Some(&Value::from("alice")));
    assert_eq!(data.get("kind"), Some(&Value::from("user")));
}

#[test]
fn drag_move_omits_kind() {
    let cmd = MoveCommand { room_name: "main".into(), role_name: "Bot".into(), x: 1.0, y: 2.0, kind: None };
    assert!(!move_data(&cmd).contains_key("kind"));
}
