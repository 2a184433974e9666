use super::*;

fn room_with(names: &[(&str, OccupantKind)]) -> Room {
    let mut room = Room::default();
    for (i, (name, kind)) in names.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = 100.0 + 100.0 * i as f64;
        room.set_occupant(OccupantUpdate::at(*name, x, 100.0).with_kind(*kind));
    }
    room
}

// =============================================================
// Defaults
// =============================================================

#[test]
fn default_room_is_empty_800_by_600() {
    let room = Room::default();
    assert_eq!(room.name, "main");
    assert!((room.width - 800.0).abs() < f64::EPSILON);
    assert!((room.height - 600.0).abs() < f64::EPSILON);
    assert!(room.roles.is_empty());
    assert_eq!(room.revision, 0);
    assert!((room.collision_radius - 20.0).abs() < f64::EPSILON);
}

#[test]
fn kind_parse_accepts_wire_names() {
    assert_eq!(OccupantKind::parse("user"), Some(OccupantKind::User));
    assert_eq!(OccupantKind::parse("autonomous"), Some(OccupantKind::Autonomous));
    assert_eq!(OccupantKind::parse("ai"), Some(OccupantKind::Autonomous));
    assert_eq!(OccupantKind::parse("robot"), None);
}

// =============================================================
// set_occupant
// =============================================================

#[test]
fn set_occupant_creates_with_kind_default_avatar() {
    let mut room = Room::default();
    assert_eq!(room.set_occupant(OccupantUpdate::at("Bot2", 700.0, 500.0)), Upsert::Created);

    let bot = room.occupant("Bot2").expect("created");
    assert_eq!(bot.kind, OccupantKind::Autonomous);
    assert_eq!(bot.avatar, "🤖");
    assert_eq!(bot.position(), Point::new(700.0, 500.0));
    assert_eq!(room.revision, 1);
}

#[test]
fn set_occupant_clamps_into_bounds() {
    let mut room = Room::default();
    room.set_occupant(OccupantUpdate::at("Bot", -40.0, 9000.0));
    assert_eq!(room.occupant("Bot").map(Occupant::position), Some(Point::new(0.0, 600.0)));
}

#[test]
fn set_occupant_updates_instead_of_duplicating() {
    let mut room = Room::default();
    room.set_occupant(OccupantUpdate::at("Bot", 10.0, 10.0).with_avatar("🐱"));
    assert_eq!(room.set_occupant(OccupantUpdate::at("Bot", 50.0, 60.0)), Upsert::Updated);

    assert_eq!(room.roles.len(), 1);
    let bot = room.occupant("Bot").expect("present");
    assert_eq!(bot.position(), Point::new(50.0, 60.0));
    assert_eq!(bot.avatar, "🐱", "avatar is kept when the update omits it");
}

#[test]
fn identical_update_leaves_snapshot_unchanged() {
    let mut room = Room::default();
    room.set_occupant(OccupantUpdate::at("Bot", 260.0, 300.0));
    let first = room.clone();

    assert_eq!(room.set_occupant(OccupantUpdate::at("Bot", 260.0, 300.0)), Upsert::Unchanged);
    assert_eq!(room, first);
}

#[test]
fn update_can_change_kind() {
    let mut room = Room::default();
    room.set_occupant(OccupantUpdate::at("Alice", 10.0, 10.0));
    room.set_occupant(OccupantUpdate::at("Alice", 10.0, 10.0).with_kind(OccupantKind::User));
    assert_eq!(room.occupant("Alice").map(|o| o.kind), Some(OccupantKind::User));
}

// =============================================================
// Removal
// =============================================================

#[test]
fn remove_autonomous_keeps_users() {
    let mut room = room_with(&[
        ("user", OccupantKind::User),
        ("Bot", OccupantKind::Autonomous),
        ("Carol", OccupantKind::User),
        ("Bot2", OccupantKind::Autonomous),
    ]);
    let rev = room.revision;

    assert_eq!(room.remove_autonomous(), 2);
    let names: Vec<&str> = room.roles.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["user", "Carol"]);
    assert_eq!(room.revision, rev + 1);
}

#[test]
fn remove_autonomous_on_user_only_room_is_a_no_op() {
    let mut room = room_with(&[("user", OccupantKind::User)]);
    let before = room.clone();
    assert_eq!(room.remove_autonomous(), 0);
    assert_eq!(room, before);
}

#[test]
fn remove_occupant_by_name() {
    let mut room = room_with(&[("Bot", OccupantKind::Autonomous), ("user", OccupantKind::User)]);
    let removed = room.remove_occupant("Bot").expect("removed");
    assert_eq!(removed.name, "Bot");
    assert!(!room.contains("Bot"));
    assert!(room.remove_occupant("Bot").is_none());
}

// =============================================================
// Activity and persistence
// =============================================================

#[test]
fn set_activity_bumps_revision_only_on_change() {
    let mut room = room_with(&[("Bot", OccupantKind::Autonomous)]);
    let rev = room.revision;

    room.set_activity("Bot", Some("cooking".into()));
    assert_eq!(room.revision, rev + 1);
    room.set_activity("Bot", Some("cooking".into()));
    assert_eq!(room.revision, rev + 1);
    assert!(room.set_activity("Nobody", None).is_none());
}

#[test]
fn persisted_copy_drops_activity() {
    let mut room = room_with(&[("Bot", OccupantKind::Autonomous)]);
    room.set_activity("Bot", Some("sleeping".into()));

    let saved = room.to_persisted();
    assert!(saved.roles.iter().all(|o| o.activity.is_none()));
    assert_eq!(room.occupant("Bot").and_then(|o| o.activity.as_deref()), Some("sleeping"));
}

#[test]
fn snapshot_json_shape() {
    let mut room = room_with(&[("Bot", OccupantKind::Autonomous)]);
    room.set_activity("Bot", Some("reading".into()));
    let json = serde_json::to_value(&room).expect("serialize");

    assert_eq!(json["width"], serde_json::json!(800.0));
    assert_eq!(json["collisionRadius"], serde_json::json!(20.0));
    assert!(json["layout"]["walls"].is_array());
    assert_eq!(json["roles"][0]["name"], "Bot");
    assert_eq!(json["roles"][0]["kind"], "autonomous");
    assert_eq!(json["roles"][0]["activity"], "reading");
}

#[test]
fn from_json_tolerates_authored_room_files() {
    let raw = r#"{
        "name": "main", "width": 1000, "height": 700, "scale": 10,
        "roles": [{"name": "Bot", "type": "person", "x": 120, "y": 80, "size": 20, "avatar": "🤖"}],
        "layout": {"walls": [{"id": 1, "x1": 0, "y1": 0, "x2": 0, "y2": 700, "thickness": 6}]}
    }"#;
    let room = Room::from_json(raw).expect("room should parse");
    assert!((room.width - 1000.0).abs() < f64::EPSILON);
    assert_eq!(room.revision, 0);
    assert_eq!(room.roles[0].kind, OccupantKind::Autonomous);
    assert_eq!(room.layout.walls.len(), 1);
}
