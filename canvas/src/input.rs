//! Input model: pointer buttons, persistent UI state, and the gesture state
//! machine.
//!
//! `InputState` is the gesture tracked between pointer-down and pointer-up.
//! `UiState` is what the renderer reads between gestures.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::drag::DragSession;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Occupant drawn with the "selected" style, if any.
    pub selected: Option<String>,
    /// Last user-facing notice (rejected placement, aborted drag).
    pub notice: Option<String>,
}

/// Gesture in progress.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next press.
    #[default]
    Idle,
    /// An occupant marker is held and follows the pointer.
    Dragging(DragSession),
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The session, if a drag is in progress.
    #[must_use]
    pub fn drag(&self) -> Option<&DragSession> {
        match self {
            Self::Dragging(session) => Some(session),
            Self::Idle => None,
        }
    }
}
