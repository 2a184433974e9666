//! Shared numeric constants for the canvas crate.

// ── Markers ─────────────────────────────────────────────────────

/// Side of the square marker drawn for each occupant, in room units.
pub const MARKER_SIZE: f64 = 60.0;

/// Half the marker side. Drag and placement keep the center this far inside
/// the room edges so the whole marker stays visible.
pub const MARKER_HALF: f64 = MARKER_SIZE / 2.0;

// ── Cursors ─────────────────────────────────────────────────────

pub const CURSOR_DEFAULT: &str = "default";
pub const CURSOR_GRAB: &str = "grab";
pub const CURSOR_GRABBING: &str = "grabbing";
