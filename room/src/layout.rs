//! Static room geometry.
//!
//! A [`Layout`] is read-only once a room exists. Only walls and furniture take
//! part in collision; areas, doors and windows are descriptive. Field names
//! follow the layout files the rooms are authored in (`isOuter`, `type`).

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect, Segment};

/// Orientation of a door or window opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

/// A named, colored floor region. Never collidable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub color: String,
}

impl Area {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A wall segment. Collidable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wall {
    pub id: u32,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub is_outer: bool,
}

impl Wall {
    #[must_use]
    pub fn segment(&self) -> Segment {
        Segment::new(self.x1, self.y1, self.x2, self.y2)
    }
}

/// A passable gap in a wall. Never collidable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub direction: Direction,
    /// Id of the [`Area`] this door opens into.
    #[serde(default)]
    pub area: String,
}

/// A window set into a wall. Never collidable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub direction: Direction,
}

/// A piece of furniture. Collidable over its whole rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Furniture {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Furniture {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// The anchor point used to decide which area a piece stands in.
    #[must_use]
    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// All static elements of a room.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub doors: Vec<Door>,
    #[serde(default)]
    pub windows: Vec<Window>,
    #[serde(default)]
    pub furniture: Vec<Furniture>,
}
