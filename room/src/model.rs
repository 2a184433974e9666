//! Room snapshot and occupant store operations.
//!
//! DESIGN
//! ======
//! [`Room`] is both the authoritative in-memory record the server mutates and
//! the snapshot shape broadcast to viewers. The store operations here clamp
//! and upsert but never consult the collision engine; the position protocol
//! is responsible for validating first.
//!
//! `revision` increases only when a mutation actually changes the room, so
//! re-committing an identical position produces an identical snapshot.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use serde::{Deserialize, Serialize};

use crate::consts::{AUTONOMOUS_AVATAR, DEFAULT_COLLISION_RADIUS, DEFAULT_ROOM_HEIGHT, DEFAULT_ROOM_NAME, DEFAULT_ROOM_WIDTH, USER_AVATAR};
use crate::geom::Point;
use crate::layout::Layout;

// =============================================================================
// OCCUPANT
// =============================================================================

/// Who drives an occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupantKind {
    /// Controlled by a human viewer. Survives a room clear.
    User,
    /// Driven by the simulation. Draggable; removed by a room clear.
    #[default]
    Autonomous,
}

impl OccupantKind {
    /// Glyph used when an occupant is created without one.
    #[must_use]
    pub fn default_avatar(self) -> &'static str {
        match self {
            Self::User => USER_AVATAR,
            Self::Autonomous => AUTONOMOUS_AVATAR,
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "autonomous" | "ai" => Some(Self::Autonomous),
            _ => None,
        }
    }
}

/// A named, positioned entity in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default)]
    pub kind: OccupantKind,
    /// Runtime status label. Not persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

impl Occupant {
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

fn default_avatar() -> String {
    USER_AVATAR.to_owned()
}

/// A requested insert-or-update. `None` fields keep the current value on
/// update and take the kind's default on create.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupantUpdate {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub avatar: Option<String>,
    pub kind: Option<OccupantKind>,
}

impl OccupantUpdate {
    #[must_use]
    pub fn at(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self { name: name.into(), x, y, avatar: None, kind: None }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: OccupantKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// What [`Room::set_occupant`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
    Unchanged,
}

// =============================================================================
// ROOM
// =============================================================================

/// One bounded room: static layout plus the live occupant set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(default = "default_room_name")]
    pub name: String,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Commit counter. Viewers drop snapshots older than one already applied.
    #[serde(default)]
    pub revision: u64,
    /// Exclusion distance between occupant centers, and wall half-width.
    #[serde(default = "default_collision_radius")]
    pub collision_radius: f64,
    #[serde(default)]
    pub layout: Layout,
    /// Occupants in insertion order. Names are unique.
    #[serde(default)]
    pub roles: Vec<Occupant>,
}

fn default_room_name() -> String {
    DEFAULT_ROOM_NAME.to_owned()
}

fn default_width() -> f64 {
    DEFAULT_ROOM_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_ROOM_HEIGHT
}

fn default_collision_radius() -> f64 {
    DEFAULT_COLLISION_RADIUS
}

impl Default for Room {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_NAME, DEFAULT_ROOM_WIDTH, DEFAULT_ROOM_HEIGHT)
    }
}

impl Room {
    /// Empty room with no layout and no occupants.
    #[must_use]
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            revision: 0,
            collision_radius: DEFAULT_COLLISION_RADIUS,
            layout: Layout::default(),
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_collision_radius(mut self, radius: f64) -> Self {
        self.collision_radius = radius;
        self
    }

    /// Parse a full room document.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed input.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    // --- Queries ---

    #[must_use]
    pub fn occupant(&self, name: &str) -> Option<&Occupant> {
        self.roles.iter().find(|o| o.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.occupant(name).is_some()
    }

    /// Clamp a point into `[0, width] x [0, height]`.
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        p.clamp(Point::new(0.0, 0.0), Point::new(self.width, self.height))
    }

    /// Copy suitable for writing to disk: runtime activity labels dropped.
    #[must_use]
    pub fn to_persisted(&self) -> Room {
        let mut out = self.clone();
        for occupant in &mut out.roles {
            occupant.activity = None;
        }
        out
    }

    // --- Store operations ---

    /// Insert or update the occupant keyed by `update.name`, clamping the
    /// position into bounds. Does not check collisions.
    pub fn set_occupant(&mut self, update: OccupantUpdate) -> Upsert {
        let at = self.clamp(Point::new(update.x, update.y));

        if let Some(existing) = self.roles.iter_mut().find(|o| o.name == update.name) {
            let before = existing.clone();
            existing.x = at.x;
            existing.y = at.y;
            if let Some(avatar) = update.avatar {
                existing.avatar = avatar;
            }
            if let Some(kind) = update.kind {
                existing.kind = kind;
            }
            if *existing == before {
                return Upsert::Unchanged;
            }
            self.revision += 1;
            return Upsert::Updated;
        }

        let kind = update.kind.unwrap_or_default();
        self.roles.push(Occupant {
            avatar: update
                .avatar
                .unwrap_or_else(|| kind.default_avatar().to_owned()),
            name: update.name,
            x: at.x,
            y: at.y,
            kind,
            activity: None,
        });
        self.revision += 1;
        Upsert::Created
    }

    /// Remove one occupant by name.
    pub fn remove_occupant(&mut self, name: &str) -> Option<Occupant> {
        let idx = self.roles.iter().position(|o| o.name == name)?;
        self.revision += 1;
        Some(self.roles.remove(idx))
    }

    /// Remove every autonomous occupant, keeping users. Returns how many went.
    pub fn remove_autonomous(&mut self) -> usize {
        let before = self.roles.len();
        self.roles.retain(|o| o.kind == OccupantKind::User);
        let removed = before - self.roles.len();
        if removed > 0 {
            self.revision += 1;
        }
        removed
    }

    /// Set or clear an occupant's activity label. `None` if the name is unknown.
    pub fn set_activity(&mut self, name: &str, activity: Option<String>) -> Option<&Occupant> {
        let idx = self.roles.iter().position(|o| o.name == name)?;
        if self.roles[idx].activity != activity {
            self.roles[idx].activity = activity;
            self.revision += 1;
        }
        self.roles.get(idx)
    }
}
