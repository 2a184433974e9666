//! Collision engine: the single legality predicate for occupant positions.
//!
//! A candidate point is blocked when, in this order:
//! 1. it lies within `collision_radius` of an axis-aligned wall, inside the
//!    wall's span;
//! 2. it lies inside (inclusive) a furniture rectangle;
//! 3. it lies closer than `collision_radius` to another occupant's center.
//!
//! Doors, windows and areas never block. The occupant-vs-occupant test
//! compares raw center distance against one `collision_radius`, not the sum of
//! two radii; callers rely on that exact threshold.

#[cfg(test)]
#[path = "collision_test.rs"]
mod collision_test;

use std::fmt;

use crate::geom::{Point, circles_overlap, point_in_rect, point_near_axis_segment};
use crate::model::Room;

/// The first obstacle found at a candidate point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    Wall { id: u32 },
    Furniture { id: u32, name: String },
    Occupant { name: String },
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wall { id } => write!(f, "wall #{id}"),
            Self::Furniture { id, name } => write!(f, "furniture '{name}' (#{id})"),
            Self::Occupant { name } => write!(f, "occupant '{name}'"),
        }
    }
}

impl Blocker {
    /// Stable lowercase tag for wire payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Wall { .. } => "wall",
            Self::Furniture { .. } => "furniture",
            Self::Occupant { .. } => "occupant",
        }
    }
}

/// Find what blocks `point`, skipping the occupant named `excluding`.
#[must_use]
pub fn find_blocker(room: &Room, point: Point, excluding: Option<&str>) -> Option<Blocker> {
    let radius = room.collision_radius;

    if let Some(wall) = room
        .layout
        .walls
        .iter()
        .find(|w| point_near_axis_segment(point, &w.segment(), radius))
    {
        return Some(Blocker::Wall { id: wall.id });
    }

    if let Some(item) = room
        .layout
        .furniture
        .iter()
        .find(|f| point_in_rect(point, &f.rect()))
    {
        return Some(Blocker::Furniture { id: item.id, name: item.name.clone() });
    }

    room.roles
        .iter()
        .filter(|o| excluding != Some(o.name.as_str()))
        .find(|o| circles_overlap(point, o.position(), radius))
        .map(|o| Blocker::Occupant { name: o.name.clone() })
}

/// True when `point` is not occupiable for the occupant named `excluding`.
#[must_use]
pub fn is_blocked(room: &Room, point: Point, excluding: Option<&str>) -> bool {
    find_blocker(room, point, excluding).is_some()
}
