//! Shared numeric defaults for the room model.

// ── Bounds ──────────────────────────────────────────────────────

/// Width of a room created without a template.
pub const DEFAULT_ROOM_WIDTH: f64 = 800.0;

/// Height of a room created without a template.
pub const DEFAULT_ROOM_HEIGHT: f64 = 600.0;

/// Name of the room clients join when they don't ask for one.
pub const DEFAULT_ROOM_NAME: &str = "main";

// ── Collision ───────────────────────────────────────────────────

/// Occupant exclusion distance and wall half-width.
pub const DEFAULT_COLLISION_RADIUS: f64 = 20.0;

// ── Sensing ─────────────────────────────────────────────────────

/// Upper bound (exclusive) of the "very close" hearing tier.
pub const VERY_CLOSE_DISTANCE: f64 = 100.0;

/// Upper bound (exclusive) of the "close" hearing tier.
pub const CLOSE_DISTANCE: f64 = 200.0;

/// Upper bound (exclusive) of the "far" hearing tier; beyond it nothing is heard.
pub const FAR_DISTANCE: f64 = 300.0;

// ── Avatars ─────────────────────────────────────────────────────

/// Glyph given to a user occupant created without one.
pub const USER_AVATAR: &str = "👤";

/// Glyph given to an autonomous occupant created without one.
pub const AUTONOMOUS_AVATAR: &str = "🤖";
