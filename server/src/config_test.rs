use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn empty_environment_uses_defaults() {
    let config = ServerConfig::from_lookup(lookup_from(&[])).expect("defaults");
    assert_eq!(config.port, 3000);
    assert_eq!(config.data_dir, PathBuf::from("room_data"));
    assert_eq!(config.template, "main.json");
    assert!((config.room_width - 800.0).abs() < f64::EPSILON);
    assert!((config.room_height - 600.0).abs() < f64::EPSILON);
    assert!((config.collision_radius - 20.0).abs() < f64::EPSILON);
    assert_eq!(config.persist_interval, Duration::from_millis(1000));
    assert!(config.static_dir.is_none());
}

#[test]
fn values_are_read() {
    let config = ServerConfig::from_lookup(lookup_from(&[
        ("PORT", "8080"),
        ("ROOM_DATA_DIR", "/var/rooms"),
        ("ROOM_TEMPLATE", "office.json"),
        ("COLLISION_RADIUS", " 35.5 "),
        ("PERSIST_INTERVAL_MS", "250"),
        ("STATIC_DIR", "public"),
    ]))
    .expect("valid config");

    assert_eq!(config.port, 8080);
    assert_eq!(config.template_path(), Some(PathBuf::from("/var/rooms/office.json")));
    assert!((config.collision_radius - 35.5).abs() < f64::EPSILON);
    assert_eq!(config.persist_interval, Duration::from_millis(250));
    assert_eq!(config.static_dir, Some(PathBuf::from("public")));
}

#[test]
fn malformed_number_is_an_error() {
    let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).expect_err("bad port");
    assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    assert!(err.to_string().contains("eighty"));
}

#[test]
fn blank_template_disables_it() {
    let config = ServerConfig::from_lookup(lookup_from(&[("ROOM_TEMPLATE", "")])).expect("valid");
    assert!(config.template_path().is_none());
}
