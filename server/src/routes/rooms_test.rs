use super::*;
use axum::body::to_bytes;

use crate::state::test_helpers;

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn seeded() -> AppState {
    let state = test_helpers::test_app_state();
    test_helpers::seed_room(&state, test_helpers::scenario_room("main")).await;
    state
}

#[test]
fn status_codes_follow_error_codes() {
    assert_eq!(status_for_code("E_COLLISION"), StatusCode::CONFLICT);
    assert_eq!(status_for_code("E_ROLE_NOT_FOUND"), StatusCode::NOT_FOUND);
    assert_eq!(status_for_code("E_INVALID_REQUEST"), StatusCode::BAD_REQUEST);
    assert_eq!(status_for_code("E_EMPTY_MESSAGE"), StatusCode::BAD_REQUEST);
    assert_eq!(status_for_code("E_STORE"), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn get_room_returns_snapshot() {
    let state = seeded().await;
    let Json(room) = get_room(State(state), Path("main".into())).await.expect("room");
    assert_eq!(room.roles.len(), 2);
    assert_eq!(room.layout.walls.len(), 1);
}

#[tokio::test]
async fn get_room_rejects_bad_name() {
    let state = seeded().await;
    let err = get_room(State(state), Path("../x".into())).await.expect_err("bad name");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn move_into_wall_is_409_with_detail() {
    let state = seeded().await;
    let body = PositionBody { x: 200.0, y: 300.0, avatar: None, kind: None };
    let err = move_role(State(state), Path(("main".into(), "Bot".into())), Json(body))
        .await
        .expect_err("blocked");
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(err.code, "E_COLLISION");

    let json = body_json(err.into_response()).await;
    assert_eq!(json["status"], "error");
    assert!(json["detail"].as_str().is_some_and(|d| d.contains("wall #1")));
}

#[tokio::test]
async fn legal_move_returns_role_and_revision() {
    let state = seeded().await;
    let body = PositionBody { x: 260.0, y: 300.0, avatar: None, kind: None };
    let Json(reply) = move_role(State(state.clone()), Path(("main".into(), "Bot".into())), Json(body))
        .await
        .expect("committed");
    assert_eq!(reply["status"], "success");
    assert_eq!(reply["role"]["x"], 260.0);

    let room = rooms::snapshot(&state, "main").await.expect("room");
    assert_eq!(reply["revision"], room.revision);
}

#[tokio::test]
async fn add_role_parses_kind() {
    let state = seeded().await;
    let body = AddRoleBody { role_name: "Carol".into(), x: 700.0, y: 100.0, avatar: None, kind: Some("user".into()) };
    let Json(reply) = add_role(State(state.clone()), Path("main".into()), Json(body)).await.expect("added");
    assert_eq!(reply["role"]["kind"], "user");
    assert_eq!(reply["role"]["avatar"], "👤");

    let bad = AddRoleBody { role_name: "Dan".into(), x: 700.0, y: 200.0, avatar: None, kind: Some("robot".into()) };
    let err = add_role(State(state), Path("main".into()), Json(bad)).await.expect_err("bad kind");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clear_and_remove() {
    let state = seeded().await;
    let Json(reply) = clear_room(State(state.clone()), Path("main".into())).await.expect("clear");
    assert_eq!(reply["removed"], 1);

    let err = remove_role(State(state.clone()), Path(("main".into(), "Bot".into())))
        .await
        .expect_err("already cleared");
    assert_eq!(err.status, StatusCode::NOT_FOUND);

    let Json(reply) = remove_role(State(state), Path(("main".into(), "user".into()))).await.expect("removed");
    assert_eq!(reply["role"], "user");
}

#[tokio::test]
async fn activity_round_trip() {
    let state = seeded().await;
    let body = ActivityBody { activity: Some("napping".into()) };
    let Json(reply) = set_activity(State(state), Path(("main".into(), "Bot".into())), Json(body))
        .await
        .expect("set");
    assert_eq!(reply["role"]["activity"], "napping");
}

#[tokio::test]
async fn nearby_roles_defaults_to_far_range() {
    let state = seeded().await;
    let query = NearbyQuery { user_x: 120.0, user_y: 100.0, max_distance: None };
    let Json(reply) = nearby_roles(State(state), Path("main".into()), Query(query)).await.expect("nearby");
    assert_eq!(reply.count, 1);
    assert_eq!(reply.nearby_roles[0].name, "Bot");
}

#[tokio::test]
async fn surroundings_unknown_role_is_404() {
    let state = seeded().await;
    let err = role_surroundings(State(state), Path(("main".into(), "Ghost".into())))
        .await
        .expect_err("unknown");
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn distance_chat_reports_receivers() {
    let state = seeded().await;
    let body = DistanceChatBody { sender: "user".into(), message: "hi".into(), x: 150.0, y: 100.0 };
    let Json(reply) = distance_chat(State(state.clone()), Path("main".into()), Json(body)).await.expect("sent");
    assert_eq!(reply["status"], "success");
    assert_eq!(reply["receivers"], 1);

    let empty = DistanceChatBody { sender: "user".into(), message: String::new(), x: 0.0, y: 0.0 };
    let err = distance_chat(State(state), Path("main".into()), Json(empty)).await.expect_err("empty");
    let json = body_json(err.into_response()).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "E_EMPTY_MESSAGE");
}
