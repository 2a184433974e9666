//! Room REST routes.
//!
//! Thin translation onto the same service entry points the websocket uses,
//! so REST mutations are serialized and broadcast exactly like frames.
//! Errors come back as `{status: "error", code, detail}` with an HTTP status
//! chosen from the error code.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use room::consts::FAR_DISTANCE;
use room::sense::{Nearby, Surroundings, nearby, surroundings};
use room::{OccupantKind, Point, Room};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::frame::ErrorCode;
use crate::services::chat::{self, ChatMessage};
use crate::services::position::{self, MoveRequest, PositionError};
use crate::services::room as rooms;
use crate::state::AppState;

// =============================================================================
// ERRORS
// =============================================================================

/// Error body shared by every room route.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub detail: String,
}

impl ApiError {
    fn from_code(err: &impl ErrorCode) -> Self {
        let code = err.error_code();
        Self { status: status_for_code(code), code, detail: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "status": "error", "code": self.code, "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}

impl<E: ErrorCode> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self::from_code(&err)
    }
}

pub(crate) fn status_for_code(code: &str) -> StatusCode {
    match code {
        "E_COLLISION" => StatusCode::CONFLICT,
        "E_ROLE_NOT_FOUND" => StatusCode::NOT_FOUND,
        "E_INVALID_REQUEST" | "E_EMPTY_MESSAGE" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// BODIES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddRoleBody {
    pub role_name: String,
    pub x: f64,
    pub y: f64,
    pub avatar: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PositionBody {
    pub x: f64,
    pub y: f64,
    pub avatar: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityBody {
    pub activity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub user_x: f64,
    pub user_y: f64,
    pub max_distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DistanceChatBody {
    pub sender: String,
    pub message: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub room_name: String,
    pub user_position: Point,
    pub nearby_roles: Vec<Nearby>,
    pub count: usize,
}

fn parse_kind(raw: Option<&str>) -> Result<Option<OccupantKind>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => OccupantKind::parse(s)
            .map(Some)
            .ok_or_else(|| PositionError::Invalid(format!("unknown kind: {s}")).into()),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/room/{room}` returns the full snapshot.
pub async fn get_room(State(state): State<AppState>, Path(room): Path<String>) -> Result<Json<Room>, ApiError> {
    Ok(Json(rooms::snapshot(&state, &room).await?))
}

/// `POST /api/room/{room}/clear` removes autonomous occupants.
pub async fn clear_room(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = position::clear(&state, &room).await?;
    Ok(Json(json!({ "status": "success", "removed": removed })))
}

/// `POST /api/room/{room}/role` adds or updates an occupant.
pub async fn add_role(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Json(body): Json<AddRoleBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = MoveRequest {
        role: body.role_name,
        x: body.x,
        y: body.y,
        avatar: body.avatar,
        kind: parse_kind(body.kind.as_deref())?,
    };
    let committed = position::submit(&state, &room, req).await?;
    Ok(Json(json!({ "status": "success", "role": committed.role, "revision": committed.revision })))
}

/// `PUT /api/room/{room}/role/{role}/position` moves an occupant.
pub async fn move_role(
    State(state): State<AppState>,
    Path((room, role)): Path<(String, String)>,
    Json(body): Json<PositionBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = MoveRequest {
        role,
        x: body.x,
        y: body.y,
        avatar: body.avatar,
        kind: parse_kind(body.kind.as_deref())?,
    };
    let committed = position::submit(&state, &room, req).await?;
    Ok(Json(json!({ "status": "success", "role": committed.role, "revision": committed.revision })))
}

/// `DELETE /api/room/{room}/role/{role}` removes an occupant.
pub async fn remove_role(
    State(state): State<AppState>,
    Path((room, role)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = position::remove(&state, &room, &role).await?;
    Ok(Json(json!({ "status": "success", "role": removed.name })))
}

/// `PUT /api/room/{room}/role/{role}/activity` sets or clears the label.
pub async fn set_activity(
    State(state): State<AppState>,
    Path((room, role)): Path<(String, String)>,
    Json(body): Json<ActivityBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let occupant = position::set_activity(&state, &room, &role, body.activity).await?;
    Ok(Json(json!({ "status": "success", "role": occupant })))
}

/// `GET /api/room/{room}/role/{role}/surroundings`
pub async fn role_surroundings(
    State(state): State<AppState>,
    Path((room, role)): Path<(String, String)>,
) -> Result<Json<Surroundings>, ApiError> {
    let snapshot = rooms::snapshot(&state, &room).await?;
    surroundings(&snapshot, &role)
        .map(Json)
        .ok_or_else(|| PositionError::RoleNotFound(role).into())
}

/// `GET /nearby_roles/{room}?user_x&user_y&max_distance`
pub async fn nearby_roles(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let snapshot = rooms::snapshot(&state, &room).await?;
    let origin = Point::new(query.user_x, query.user_y);
    let roles = nearby(&snapshot, origin, query.max_distance.unwrap_or(FAR_DISTANCE), None);
    Ok(Json(NearbyResponse { room_name: room, user_position: origin, count: roles.len(), nearby_roles: roles }))
}

/// `POST /distance_chat/{room}` says something at a point.
pub async fn distance_chat(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Json(body): Json<DistanceChatBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let msg = ChatMessage { sender: body.sender, message: body.message, x: body.x, y: body.y };
    let hearers = chat::say(&state, &room, msg).await?;
    Ok(Json(json!({ "status": "success", "receivers": hearers.receivers(), "hearers": hearers })))
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
