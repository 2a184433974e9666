//! Position update protocol: validate, commit, broadcast.
//!
//! DESIGN
//! ======
//! Every request follows `received -> validated -> committed` or
//! `received -> rejected`. The whole cycle runs under the room's mutex, so
//! two requests for the same room are never validated against the same
//! pre-commit snapshot.
//!
//! - Targets are clamped into room bounds before validation; out-of-bounds
//!   input is never an error.
//! - The collision check excludes the moving occupant so it cannot block
//!   itself at its previous position.
//! - A rejection mutates nothing and broadcasts nothing; the caller reports
//!   it to the requester only.
//! - A commit always broadcasts the full snapshot, even when the position was
//!   already current, so an idempotent resend still confirms the requester.
//!
//! Removal, clear and activity updates skip collision checks entirely.

use room::{Blocker, Occupant, OccupantKind, OccupantUpdate, Point, Upsert, find_blocker};
use tracing::info;

use crate::frame::{Data, ErrorCode};
use crate::services::room::{RoomError, get_room, publish};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("({x}, {y}) is blocked by {blocker}")]
    Collision { blocker: Blocker, x: f64, y: f64 },
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("role not found: {0}")]
    RoleNotFound(String),
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl ErrorCode for PositionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Collision { .. } => "E_COLLISION",
            Self::Invalid(_) => "E_INVALID_REQUEST",
            Self::RoleNotFound(_) => "E_ROLE_NOT_FOUND",
            Self::Room(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Room(e) => e.retryable(),
            _ => false,
        }
    }

    fn error_details(&self) -> Data {
        let mut data = Data::new();
        if let Self::Collision { blocker, x, y } = self {
            data.insert("blocker".into(), serde_json::json!(blocker.kind()));
            data.insert("detail".into(), serde_json::json!(blocker.to_string()));
            data.insert("x".into(), serde_json::json!(x));
            data.insert("y".into(), serde_json::json!(y));
        }
        data
    }
}

/// A request to put `role` at `(x, y)`, creating it if absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub role: String,
    pub x: f64,
    pub y: f64,
    pub avatar: Option<String>,
    pub kind: Option<OccupantKind>,
}

impl MoveRequest {
    pub fn new(role: impl Into<String>, x: f64, y: f64) -> Self {
        Self { role: role.into(), x, y, avatar: None, kind: None }
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone)]
pub struct Committed {
    pub role: Occupant,
    pub revision: u64,
    pub upsert: Upsert,
}

// =============================================================================
// PROTOCOL ENTRY POINTS
// =============================================================================

/// Validate and commit a position. Shared by add and move.
///
/// # Errors
///
/// - [`PositionError::Invalid`] for an empty name or non-finite coordinates.
/// - [`PositionError::Collision`] when the clamped target is blocked.
/// - [`PositionError::Room`] when the room cannot be loaded.
pub async fn submit(state: &AppState, room_name: &str, req: MoveRequest) -> Result<Committed, PositionError> {
    let role = role_name(&req.role)?;
    if !req.x.is_finite() || !req.y.is_finite() {
        return Err(PositionError::Invalid(format!("coordinates must be finite: ({}, {})", req.x, req.y)));
    }

    let shared = get_room(state, room_name).await?;
    let mut rs = shared.lock().await;

    // PHASE: VALIDATE
    let target = rs.room.clamp(Point::new(req.x, req.y));
    if let Some(blocker) = find_blocker(&rs.room, target, Some(role)) {
        info!(room = %room_name, role = %role, x = target.x, y = target.y, %blocker, "position rejected");
        return Err(PositionError::Collision { blocker, x: target.x, y: target.y });
    }

    // PHASE: COMMIT
    let upsert = rs.room.set_occupant(OccupantUpdate {
        name: role.to_owned(),
        x: target.x,
        y: target.y,
        avatar: req.avatar,
        kind: req.kind,
    });
    let occupant = rs
        .room
        .occupant(role)
        .cloned()
        .ok_or_else(|| PositionError::RoleNotFound(role.to_owned()))?;
    let revision = rs.room.revision;

    // PHASE: BROADCAST
    publish(&mut rs, upsert != Upsert::Unchanged);
    info!(room = %room_name, role = %role, x = target.x, y = target.y, revision, ?upsert, "position committed");

    Ok(Committed { role: occupant, revision, upsert })
}

/// Remove one occupant unconditionally.
///
/// # Errors
///
/// [`PositionError::RoleNotFound`] if no occupant has that name; nothing is
/// broadcast in that case.
pub async fn remove(state: &AppState, room_name: &str, role: &str) -> Result<Occupant, PositionError> {
    let role = role_name(role)?;
    let shared = get_room(state, room_name).await?;
    let mut rs = shared.lock().await;

    let removed = rs
        .room
        .remove_occupant(role)
        .ok_or_else(|| PositionError::RoleNotFound(role.to_owned()))?;
    publish(&mut rs, true);
    info!(room = %room_name, role = %role, revision = rs.room.revision, "role removed");
    Ok(removed)
}

/// Remove every autonomous occupant. Returns how many were removed.
///
/// # Errors
///
/// [`PositionError::Room`] when the room cannot be loaded.
pub async fn clear(state: &AppState, room_name: &str) -> Result<usize, PositionError> {
    let shared = get_room(state, room_name).await?;
    let mut rs = shared.lock().await;

    let removed = rs.room.remove_autonomous();
    publish(&mut rs, removed > 0);
    info!(room = %room_name, removed, remaining = rs.room.roles.len(), "room cleared");
    Ok(removed)
}

/// Set or clear the activity label of an existing occupant. A blank label
/// clears it.
///
/// # Errors
///
/// [`PositionError::RoleNotFound`] if no occupant has that name.
pub async fn set_activity(
    state: &AppState,
    room_name: &str,
    role: &str,
    activity: Option<String>,
) -> Result<Occupant, PositionError> {
    let role = role_name(role)?;
    let activity = activity
        .map(|a| a.trim().to_owned())
        .filter(|a| !a.is_empty());

    let shared = get_room(state, room_name).await?;
    let mut rs = shared.lock().await;

    let before = rs.room.revision;
    let occupant = rs
        .room
        .set_activity(role, activity)
        .cloned()
        .ok_or_else(|| PositionError::RoleNotFound(role.to_owned()))?;
    // The label itself is not persisted, but the revision it bumped is.
    let changed = rs.room.revision != before;
    publish(&mut rs, changed);
    info!(room = %room_name, role = %role, activity = ?occupant.activity, changed, "activity updated");
    Ok(occupant)
}

/// Occupant names are keyed trimmed at every entry point.
fn role_name(raw: &str) -> Result<&str, PositionError> {
    let role = raw.trim();
    if role.is_empty() {
        return Err(PositionError::Invalid("role_name required".into()));
    }
    Ok(role)
}

#[cfg(test)]
#[path = "position_test.rs"]
mod tests;
