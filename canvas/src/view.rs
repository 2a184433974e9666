//! Local, read-only copy of a room as last broadcast by the server.
//!
//! The view is disposable: every `room:snapshot` replaces it wholesale.
//! Snapshots carry a revision; one older than the revision already applied
//! for the same room is dropped so a late broadcast can never roll the view
//! back. The snapshot returned by a join starts a new subscription and goes
//! through [`RoomView::reset`] instead: after a server restart its revision
//! may be lower than anything seen before.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use room::{Occupant, Point, Room};

use crate::consts::{MARKER_HALF, MARKER_SIZE};

/// Result of offering a snapshot to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The snapshot replaced the view.
    Replaced,
    /// The snapshot was older than the current view and was dropped.
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct RoomView {
    room: Option<Room>,
}

impl RoomView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a server snapshot. A snapshot for a different room always wins.
    pub fn apply(&mut self, snapshot: Room) -> Applied {
        if let Some(current) = &self.room {
            if current.name == snapshot.name && snapshot.revision < current.revision {
                return Applied::Stale;
            }
        }
        self.room = Some(snapshot);
        Applied::Replaced
    }

    /// Replace the view unconditionally. Used for the join reply.
    pub fn reset(&mut self, snapshot: Room) {
        self.room = Some(snapshot);
    }

    #[must_use]
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    #[must_use]
    pub fn revision(&self) -> Option<u64> {
        self.room.as_ref().map(|r| r.revision)
    }

    /// Topmost occupant whose marker covers `p`. Later roles draw on top.
    #[must_use]
    pub fn marker_at(&self, p: Point) -> Option<&Occupant> {
        self.room.as_ref()?.roles.iter().rev().find(|o| marker_contains(o, p))
    }
}

/// Whether `p` falls inside the square marker centered on `occupant`.
#[must_use]
pub fn marker_contains(occupant: &Occupant, p: Point) -> bool {
    let left = occupant.x - MARKER_HALF;
    let top = occupant.y - MARKER_HALF;
    p.x >= left && p.x <= left + MARKER_SIZE && p.y >= top && p.y <= top + MARKER_SIZE
}

/// Clamp a marker center so the whole marker stays inside the room.
#[must_use]
pub fn clamp_marker(room: &Room, p: Point) -> Point {
    let min = Point::new(MARKER_HALF, MARKER_HALF);
    let max = Point::new(
        (room.width - MARKER_HALF).max(MARKER_HALF),
        (room.height - MARKER_HALF).max(MARKER_HALF),
    );
    p.clamp(min, max)
}
