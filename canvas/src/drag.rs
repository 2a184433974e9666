//! Drag session and click placement.
//!
//! DESIGN
//! ======
//! A [`DragSession`] is built on press and consumed on release. It owns the
//! snapshot captured at press time and runs the shared collision predicate
//! against it on every move, so previews never wait on the network. Only
//! release produces a [`MoveCommand`]; the server revalidates it.
//!
//! Placement is the one-shot sibling for the viewer's own occupant: clamp,
//! check, and either produce a command or report why not.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use room::{Blocker, OccupantKind, Point, Room, find_blocker};
use serde::Serialize;

use crate::view::clamp_marker;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("no occupant named {0}")]
    NotFound(String),
    #[error("{0} is user-controlled and cannot be dragged")]
    NotDraggable(String),
    #[error("{0} left the room during the drag")]
    Vanished(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("no room loaded")]
    NoRoom,
    #[error("cannot place here: blocked by {0}")]
    Blocked(Blocker),
}

/// The single request a finished gesture asks the host to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveCommand {
    pub room_name: String,
    pub role_name: String,
    pub x: f64,
    pub y: f64,
    /// Set when the command also claims who drives the occupant; a drag
    /// leaves the existing kind alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<OccupantKind>,
}

/// One continuous pointer interaction moving one occupant.
#[derive(Debug, Clone)]
pub struct DragSession {
    name: String,
    snapshot: Room,
    /// Marker center minus pointer, captured on press.
    grab_offset: Point,
    origin: Point,
    preview: Point,
}

impl DragSession {
    /// Start dragging `name` from a press at `pointer`.
    ///
    /// # Errors
    ///
    /// [`DragError::NotFound`] if the occupant is absent and
    /// [`DragError::NotDraggable`] for user-controlled occupants.
    pub fn start(room: &Room, name: &str, pointer: Point) -> Result<Self, DragError> {
        let occupant = room.occupant(name).ok_or_else(|| DragError::NotFound(name.to_owned()))?;
        if occupant.kind == OccupantKind::User {
            return Err(DragError::NotDraggable(name.to_owned()));
        }
        let center = occupant.position();
        Ok(Self {
            name: name.to_owned(),
            snapshot: room.clone(),
            grab_offset: Point::new(center.x - pointer.x, center.y - pointer.y),
            origin: center,
            preview: center,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last legal center shown to the user.
    #[must_use]
    pub fn preview(&self) -> Point {
        self.preview
    }

    /// Whether the preview has left the starting center.
    #[must_use]
    pub fn moved(&self) -> bool {
        self.preview != self.origin
    }

    /// Follow the pointer. Returns the new preview, or `None` when the
    /// candidate is blocked and the preview stays where it was.
    pub fn drag_to(&mut self, pointer: Point) -> Option<Point> {
        let candidate = Point::new(pointer.x + self.grab_offset.x, pointer.y + self.grab_offset.y);
        let bounded = clamp_marker(&self.snapshot, candidate);
        if find_blocker(&self.snapshot, bounded, Some(&self.name)).is_some() {
            return None;
        }
        self.preview = bounded;
        Some(bounded)
    }

    /// Fold a newer snapshot into the session: occupants that left are
    /// dropped from the captured snapshot; everything else stays as captured.
    ///
    /// # Errors
    ///
    /// [`DragError::Vanished`] if the dragged occupant itself is gone.
    pub fn reconcile(&mut self, latest: &Room) -> Result<(), DragError> {
        if !latest.contains(&self.name) {
            return Err(DragError::Vanished(self.name.clone()));
        }
        self.snapshot.roles.retain(|o| latest.contains(&o.name));
        Ok(())
    }

    /// End the drag. Always yields one command, even with no net movement.
    #[must_use]
    pub fn finish(self) -> MoveCommand {
        let at = self.preview.round();
        MoveCommand { room_name: self.snapshot.name, role_name: self.name, x: at.x, y: at.y, kind: None }
    }
}

/// Place `viewer` at a clicked point. The command marks the occupant as
/// user-controlled, so a first placement creates it as a user.
///
/// # Errors
///
/// [`PlacementError::Blocked`] when the clamped point is obstructed; no
/// command is produced in that case.
pub fn place(room: &Room, viewer: &str, click: Point) -> Result<MoveCommand, PlacementError> {
    let at = clamp_marker(room, click).round();
    if let Some(blocker) = find_blocker(room, at, Some(viewer)) {
        return Err(PlacementError::Blocked(blocker));
    }
    Ok(MoveCommand {
        room_name: room.name.clone(),
        role_name: viewer.to_owned(),
        x: at.x,
        y: at.y,
        kind: Some(OccupantKind::User),
    })
}
