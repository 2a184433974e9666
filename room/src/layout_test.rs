use super::*;

const AUTHORED: &str = r##"{
    "areas": [{"id": "kitchen", "name": "Kitchen", "x": 0, "y": 0, "width": 200, "height": 300, "color": "#fde"}],
    "walls": [{"id": 1, "x1": 200, "y1": 0, "x2": 200, "y2": 600, "thickness": 4, "isOuter": true}],
    "doors": [{"id": 1, "name": "Kitchen door", "x": 200, "y": 120, "width": 40, "thickness": 4, "direction": "vertical", "area": "kitchen"}],
    "windows": [{"id": 1, "x": 50, "y": 0, "width": 60, "thickness": 4, "direction": "horizontal"}],
    "furniture": [{"id": 7, "name": "Table", "type": "table", "x": 40, "y": 40, "width": 80, "height": 50, "color": "#a52"}]
}"##;

#[test]
fn parses_authored_layout() {
    let layout: Layout = serde_json::from_str(AUTHORED).expect("layout should parse");
    assert_eq!(layout.areas.len(), 1);
    assert!(layout.walls[0].is_outer);
    assert!((layout.walls[0].thickness - 4.0).abs() < f64::EPSILON);
    assert_eq!(layout.doors[0].direction, Direction::Vertical);
    assert_eq!(layout.doors[0].area, "kitchen");
    assert_eq!(layout.windows.len(), 1);
    assert_eq!(layout.furniture[0].kind, "table");
    assert!(layout.furniture[0].description.is_none());
}

#[test]
fn missing_sections_default_to_empty() {
    let layout: Layout = serde_json::from_str(r#"{"walls": []}"#).expect("layout should parse");
    assert!(layout.areas.is_empty());
    assert!(layout.doors.is_empty());
    assert!(layout.windows.is_empty());
    assert!(layout.furniture.is_empty());
}

#[test]
fn wall_serializes_camel_case_flag() {
    let wall = Wall { id: 3, x1: 0.0, y1: 0.0, x2: 0.0, y2: 10.0, thickness: 2.0, is_outer: false };
    let json = serde_json::to_value(&wall).expect("serialize");
    assert_eq!(json["isOuter"], serde_json::json!(false));
    assert!(json.get("is_outer").is_none());
}

#[test]
fn shape_accessors() {
    let layout: Layout = serde_json::from_str(AUTHORED).expect("layout should parse");
    let seg = layout.walls[0].segment();
    assert_eq!(seg, Segment::new(200.0, 0.0, 200.0, 600.0));
    let rect = layout.furniture[0].rect();
    assert_eq!(rect, Rect::new(40.0, 40.0, 80.0, 50.0));
    assert_eq!(layout.areas[0].rect(), Rect::new(0.0, 0.0, 200.0, 300.0));
    assert_eq!(layout.furniture[0].anchor(), Point::new(40.0, 40.0));
}
