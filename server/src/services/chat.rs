//! Distance-gated chat.
//!
//! A message is said at a point; every other occupant within hearing range
//! is sorted into a tier by distance. The tiers are pushed to subscribers as
//! a `chat:message` frame. Nothing here touches occupant positions.

use room::Point;
use room::sense::{DistanceTier, nearby};
use serde::Serialize;
use tracing::info;

use crate::frame::{Data, ErrorCode, Frame};
use crate::services::room::{RoomError, broadcast, get_room};
use crate::state::AppState;

/// Syscall of the push carrying a spoken message to subscribers.
pub const CHAT_SYSCALL: &str = "chat:message";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "E_EMPTY_MESSAGE",
            Self::Invalid(_) => "E_INVALID_REQUEST",
            Self::Room(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Room(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: String,
    pub message: String,
    pub x: f64,
    pub y: f64,
}

/// Names of the occupants who heard a message, by tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hearers {
    pub very_close: Vec<String>,
    pub close: Vec<String>,
    pub far: Vec<String>,
}

impl Hearers {
    /// Occupants who heard the message clearly.
    #[must_use]
    pub fn receivers(&self) -> usize {
        self.very_close.len()
    }
}

/// Say `msg` in the room and push it to every subscriber.
///
/// # Errors
///
/// [`ChatError::EmptyMessage`] for a blank message, [`ChatError::Invalid`]
/// for a missing sender or non-finite position.
pub async fn say(state: &AppState, room_name: &str, msg: ChatMessage) -> Result<Hearers, ChatError> {
    let message = msg.message.trim();
    if message.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if msg.sender.trim().is_empty() {
        return Err(ChatError::Invalid("sender required".into()));
    }
    if !msg.x.is_finite() || !msg.y.is_finite() {
        return Err(ChatError::Invalid("position must be finite".into()));
    }

    let shared = get_room(state, room_name).await?;
    let rs = shared.lock().await;

    let origin = rs.room.clamp(Point::new(msg.x, msg.y));
    let mut hearers = Hearers::default();
    for seen in nearby(&rs.room, origin, f64::INFINITY, Some(&msg.sender)) {
        match seen.tier {
            Some(DistanceTier::VeryClose) => hearers.very_close.push(seen.name),
            Some(DistanceTier::Close) => hearers.close.push(seen.name),
            Some(DistanceTier::Far) => hearers.far.push(seen.name),
            None => {}
        }
    }

    let mut data = Data::new();
    data.insert("sender".into(), serde_json::json!(msg.sender));
    data.insert("message".into(), serde_json::json!(message));
    data.insert("x".into(), serde_json::json!(origin.x));
    data.insert("y".into(), serde_json::json!(origin.y));
    data.insert("hearers".into(), serde_json::to_value(&hearers).unwrap_or_default());
    let frame = Frame::request(CHAT_SYSCALL, data)
        .with_room(room_name)
        .with_from(msg.sender.clone());
    broadcast(&rs, &frame);

    info!(
        room = %room_name,
        sender = %msg.sender,
        very_close = hearers.very_close.len(),
        close = hearers.close.len(),
        far = hearers.far.len(),
        "chat delivered"
    );
    Ok(hearers)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
