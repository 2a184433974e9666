use room::{Occupant, OccupantKind, Point, Room};

use crate::consts::{CURSOR_DEFAULT, CURSOR_GRAB, CURSOR_GRABBING};
use crate::drag::{DragError, DragSession, MoveCommand, PlacementError, place};
use crate::input::{Button, InputState, UiState};
use crate::view::{Applied, RoomView};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Suppress the browser default for the event that produced this.
    PreventDefault,
    /// Send one position update for the given occupant.
    SubmitMove(MoveCommand),
    /// Show a transient message; nothing was sent.
    Notify(String),
    SetCursor(String),
    RenderNeeded,
}

/// Room view plus gesture state. Holds no browser handles, so every
/// interaction is testable by feeding points in and reading actions out.
#[derive(Debug, Default)]
pub struct EngineCore {
    pub view: RoomView,
    pub ui: UiState,
    pub input: InputState,
    /// Name of the occupant this viewer controls, once chosen.
    pub viewer: Option<String>,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_viewer(mut self, name: impl Into<String>) -> Self {
        self.viewer = Some(name.into());
        self
    }

    // --- Data inputs ---

    /// Apply a server snapshot. Stale snapshots are ignored; an in-progress
    /// drag keeps its captured snapshot but is aborted if its occupant left.
    pub fn load_snapshot(&mut self, room: Room) -> Vec<Action> {
        if self.view.apply(room) == Applied::Stale {
            return Vec::new();
        }
        self.after_replace()
    }

    /// Apply the snapshot a join replied with. It always replaces the view,
    /// whatever its revision.
    pub fn load_joined(&mut self, room: Room) -> Vec<Action> {
        self.view.reset(room);
        self.after_replace()
    }

    fn after_replace(&mut self) -> Vec<Action> {
        let mut actions = vec![Action::RenderNeeded];
        let Some(latest) = self.view.room() else {
            return actions;
        };

        if let InputState::Dragging(session) = &mut self.input {
            if let Err(e) = session.reconcile(latest) {
                self.input = InputState::Idle;
                self.ui.selected = None;
                self.ui.notice = Some(e.to_string());
                actions.push(Action::SetCursor(CURSOR_DEFAULT.into()));
                actions.push(Action::Notify(e.to_string()));
            }
        } else if let Some(selected) = &self.ui.selected {
            if !latest.contains(selected) {
                self.ui.selected = None;
            }
        }
        actions
    }

    // --- Input events ---

    /// Press: start dragging a non-user marker under the pointer.
    pub fn on_pointer_down(&mut self, pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary || !self.input.is_idle() {
            return Vec::new();
        }
        let (Some(room), Some(hit)) = (self.view.room(), self.view.marker_at(pt)) else {
            return Vec::new();
        };

        match DragSession::start(room, &hit.name, pt) {
            Ok(session) => {
                self.ui.selected = Some(session.name().to_owned());
                self.ui.notice = None;
                self.input = InputState::Dragging(session);
                vec![
                    Action::PreventDefault,
                    Action::SetCursor(CURSOR_GRABBING.into()),
                    Action::RenderNeeded,
                ]
            }
            Err(DragError::NotDraggable(_)) => Vec::new(),
            Err(e) => vec![Action::Notify(e.to_string())],
        }
    }

    /// Move: update the preview if the new spot is legal.
    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        match &mut self.input {
            InputState::Dragging(session) => match session.drag_to(pt) {
                Some(_) => vec![Action::RenderNeeded],
                None => Vec::new(),
            },
            InputState::Idle => Vec::new(),
        }
    }

    /// Release: end the drag and submit its final position.
    pub fn on_pointer_up(&mut self, _pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let InputState::Dragging(session) = std::mem::take(&mut self.input) else {
            return Vec::new();
        };
        self.ui.selected = None;
        vec![
            Action::SubmitMove(session.finish()),
            Action::SetCursor(CURSOR_GRAB.into()),
            Action::RenderNeeded,
        ]
    }

    /// Click on empty room space: place the viewer's occupant there.
    pub fn on_click(&mut self, pt: Point) -> Vec<Action> {
        if !self.input.is_idle() || self.view.marker_at(pt).is_some() {
            return Vec::new();
        }
        let Some(viewer) = self.viewer.as_deref() else {
            return Vec::new();
        };

        let placed = match self.view.room() {
            Some(room) => place(room, viewer, pt),
            None => Err(PlacementError::NoRoom),
        };
        match placed {
            Ok(cmd) => {
                self.ui.notice = None;
                vec![Action::SubmitMove(cmd)]
            }
            Err(e) => {
                self.ui.notice = Some(e.to_string());
                vec![Action::Notify(e.to_string())]
            }
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.ui.selected.as_deref()
    }

    #[must_use]
    pub fn occupant(&self, name: &str) -> Option<&Occupant> {
        self.view.room()?.occupant(name)
    }

    /// Where the renderer should draw `name`: the drag preview while it is
    /// held, otherwise the last broadcast position.
    #[must_use]
    pub fn displayed_position(&self, name: &str) -> Option<Point> {
        if let Some(session) = self.input.drag().filter(|s| s.name() == name) {
            return Some(session.preview());
        }
        self.occupant(name).map(Occupant::position)
    }

    /// Cursor to show when hovering `pt` while idle.
    #[must_use]
    pub fn hover_cursor(&self, pt: Point) -> &'static str {
        match self.view.marker_at(pt) {
            Some(o) if o.kind != OccupantKind::User => CURSOR_GRAB,
            _ => CURSOR_DEFAULT,
        }
    }
}
