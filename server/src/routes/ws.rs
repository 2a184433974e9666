//! WebSocket handler: the room publish/subscribe channel.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → decode + dispatch by syscall prefix
//! - Pushed frames from the room (snapshots, chat) → forward to client
//!
//! Handlers call the room services, which validate, commit and broadcast
//! under the room lock, then return an `Outcome` describing the reply to the
//! requester. A collision rejection becomes an error frame to the requester
//! only; nothing is broadcast for it.
//!
//! Frames arrive as JSON text or protobuf binary. Replies and pushes use
//! whichever encoding the client sent last (JSON until it sends anything).
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. `room:join` → subscribed; reply carries the current snapshot
//! 3. Mutations → reply to sender, `room:snapshot` pushed to every subscriber
//! 4. Close → unsubscribe

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use frames::{Encoding, Payload};
use futures::{Sink, SinkExt, StreamExt};
use room::OccupantKind;
use room::consts::DEFAULT_ROOM_NAME;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, ErrorCode, Frame, Status};
use crate::services;
use crate::services::chat::ChatMessage;
use crate::services::position::MoveRequest;
use crate::state::AppState;

/// Per-connection outbound queue depth.
const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// TYPES
// =============================================================================

/// What the dispatcher sends back to the requester.
enum Outcome {
    /// `done` carrying data.
    Reply(Data),
    /// Empty `done`.
    Done,
}

/// Request-shape errors caught before any service is called.
#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error("not joined to a room and no room_name given")]
    NotJoined,
    #[error("{0} required")]
    Missing(&'static str),
    #[error("unknown occupant kind: {0}")]
    UnknownKind(String),
    #[error("unknown {0} op: {1}")]
    UnknownOp(&'static str, String),
}

impl ErrorCode for RequestError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotJoined => "E_NOT_JOINED",
            Self::Missing(_) | Self::UnknownKind(_) | Self::UnknownOp(..) => "E_INVALID_REQUEST",
        }
    }
}

/// Connection-scoped state threaded through dispatch.
struct Session {
    client_id: Uuid,
    /// Display name given at upgrade; stamped as `from` on inbound frames.
    viewer: String,
    current_room: Option<String>,
    client_tx: mpsc::Sender<Frame>,
    encoding: Encoding,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let viewer = params
        .get("name")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("viewer")
        .to_owned();

    ws.on_upgrade(move |socket| run_ws(socket, state, viewer))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(socket: WebSocket, state: AppState, viewer: String) {
    let client_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();

    // Per-connection channel for frames pushed by the room.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_CHANNEL_CAPACITY);
    let mut session = Session { client_id, viewer, current_room: None, client_tx, encoding: Encoding::Json };

    let welcome = Frame::request("session:connected", Data::new())
        .with_from("server")
        .with_data("client_id", client_id.to_string());
    if send_frame(&mut sink, session.encoding, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, viewer = %session.viewer, "ws: client connected");

    loop {
        tokio::select! {
            msg = stream.next() => {
                let Some(Ok(msg)) = msg else { break };
                let payload = match msg {
                    Message::Text(text) => Payload::Text(text.as_str().to_owned()),
                    Message::Binary(bytes) => Payload::Binary(bytes.to_vec()),
                    Message::Close(_) => break,
                    _ => continue,
                };
                let replies = process_inbound(&state, &mut session, &payload).await;
                let mut closed = false;
                for frame in replies {
                    if send_frame(&mut sink, session.encoding, &frame).await.is_err() {
                        closed = true;
                        break;
                    }
                }
                if closed {
                    break;
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut sink, session.encoding, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(room) = session.current_room.take() {
        services::room::part(&state, &room, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode and handle one inbound payload; returns frames for the sender.
///
/// Kept apart from the socket so tests can drive dispatch directly.
async fn process_inbound(state: &AppState, session: &mut Session, payload: &Payload) -> Vec<Frame> {
    let (wire, encoding) = match frames::decode_payload(payload) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(client_id = %session.client_id, error = %e, "ws: invalid inbound frame");
            return vec![gateway_error(format!("invalid frame: {e}"))];
        }
    };
    session.encoding = encoding;

    let mut req = match Frame::try_from(wire) {
        Ok(req) => req,
        Err(e) => {
            warn!(client_id = %session.client_id, error = %e, "ws: rejected inbound frame");
            return vec![gateway_error(e.to_string())];
        }
    };
    req.from = Some(session.viewer.clone());

    info!(client_id = %session.client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    let result = match req.prefix() {
        "room" => handle_room(state, session, &req).await,
        "role" => handle_role(state, session, &req).await,
        "chat" => handle_chat(state, session, &req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Err(err_frame) => vec![err_frame],
    }
}

fn gateway_error(message: String) -> Frame {
    let mut frame = Frame::request("gateway:error", Data::new()).with_data("message", message);
    frame.status = Status::Error;
    frame
}

/// Room a request targets: explicit `room_name`, then the frame's room,
/// then the room this connection joined.
fn target_room(session: &Session, req: &Frame) -> Result<String, Frame> {
    req.str_field("room_name")
        .map(str::to_owned)
        .or_else(|| req.room.clone())
        .or_else(|| session.current_room.clone())
        .ok_or_else(|| req.error_from(&RequestError::NotJoined))
}

fn required_str<'a>(req: &'a Frame, key: &'static str) -> Result<&'a str, Frame> {
    req.str_field(key)
        .ok_or_else(|| req.error_from(&RequestError::Missing(key)))
}

fn required_f64(req: &Frame, key: &'static str) -> Result<f64, Frame> {
    req.f64_field(key)
        .ok_or_else(|| req.error_from(&RequestError::Missing(key)))
}

// =============================================================================
// ROOM HANDLERS
// =============================================================================

async fn handle_room(state: &AppState, session: &mut Session, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "join" => {
            let name = req
                .str_field("room_name")
                .map(str::to_owned)
                .or_else(|| req.room.clone())
                .unwrap_or_else(|| DEFAULT_ROOM_NAME.to_owned());

            if let Some(old) = session.current_room.take() {
                services::room::part(state, &old, session.client_id).await;
            }

            let room = services::room::join(state, &name, session.client_id, session.client_tx.clone())
                .await
                .map_err(|e| req.error_from(&e))?;
            session.current_room = Some(name);
            Ok(Outcome::Reply(services::room::room_data(&room)))
        }
        "part" => {
            if let Some(old) = session.current_room.take() {
                services::room::part(state, &old, session.client_id).await;
            }
            Ok(Outcome::Done)
        }
        "snapshot" => {
            let name = target_room(session, req)?;
            let room = services::room::snapshot(state, &name)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Reply(services::room::room_data(&room)))
        }
        op => Err(req.error_from(&RequestError::UnknownOp("room", op.to_owned()))),
    }
}

// =============================================================================
// ROLE HANDLERS
// =============================================================================

async fn handle_role(state: &AppState, session: &Session, req: &Frame) -> Result<Outcome, Frame> {
    let room_name = target_room(session, req)?;

    match req.op() {
        "add" | "move" => {
            let kind = match req.str_field("kind") {
                None => None,
                Some(raw) => Some(
                    OccupantKind::parse(raw)
                        .ok_or_else(|| req.error_from(&RequestError::UnknownKind(raw.to_owned())))?,
                ),
            };
            let move_req = MoveRequest {
                role: required_str(req, "role_name")?.to_owned(),
                x: required_f64(req, "x")?,
                y: required_f64(req, "y")?,
                avatar: req.str_field("avatar").map(str::to_owned),
                kind,
            };
            let committed = services::position::submit(state, &room_name, move_req)
                .await
                .map_err(|e| req.error_from(&e))?;

            let mut data = Data::new();
            data.insert("role".into(), serde_json::to_value(&committed.role).unwrap_or_default());
            data.insert("revision".into(), serde_json::json!(committed.revision));
            Ok(Outcome::Reply(data))
        }
        "remove" => {
            let role = required_str(req, "role_name")?;
            let removed = services::position::remove(state, &room_name, role)
                .await
                .map_err(|e| req.error_from(&e))?;
            let mut data = Data::new();
            data.insert("role".into(), serde_json::json!(removed.name));
            Ok(Outcome::Reply(data))
        }
        "activity" => {
            let role = required_str(req, "role_name")?;
            let activity = req.str_field("activity").map(str::to_owned);
            let occupant = services::position::set_activity(state, &room_name, role, activity)
                .await
                .map_err(|e| req.error_from(&e))?;
            let mut data = Data::new();
            data.insert("role".into(), serde_json::to_value(&occupant).unwrap_or_default());
            Ok(Outcome::Reply(data))
        }
        "clear" => {
            let removed = services::position::clear(state, &room_name)
                .await
                .map_err(|e| req.error_from(&e))?;
            let mut data = Data::new();
            data.insert("removed".into(), serde_json::json!(removed));
            Ok(Outcome::Reply(data))
        }
        op => Err(req.error_from(&RequestError::UnknownOp("role", op.to_owned()))),
    }
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

async fn handle_chat(state: &AppState, session: &Session, req: &Frame) -> Result<Outcome, Frame> {
    let room_name = target_room(session, req)?;

    match req.op() {
        "send" => {
            let msg = ChatMessage {
                sender: req
                    .str_field("sender")
                    .map_or_else(|| session.viewer.clone(), str::to_owned),
                message: req.str_field("message").unwrap_or_default().to_owned(),
                x: required_f64(req, "x")?,
                y: required_f64(req, "y")?,
            };
            let hearers = services::chat::say(state, &room_name, msg)
                .await
                .map_err(|e| req.error_from(&e))?;
            let mut data = Data::new();
            data.insert("status".into(), serde_json::json!("success"));
            data.insert("receivers".into(), serde_json::json!(hearers.receivers()));
            data.insert("hearers".into(), serde_json::to_value(&hearers).unwrap_or_default());
            Ok(Outcome::Reply(data))
        }
        op => Err(req.error_from(&RequestError::UnknownOp("chat", op.to_owned()))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame<S>(sink: &mut S, encoding: Encoding, frame: &Frame) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let payload = match encoding.encode(&frames::Frame::from(frame)) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "ws: failed to encode frame");
            return Err(());
        }
    };

    if frame.status == Status::Error {
        let code = frame.str_field("code").unwrap_or("-");
        let message = frame.str_field("message").unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }

    let msg = match payload {
        Payload::Text(text) => Message::Text(text.into()),
        Payload::Binary(bytes) => Message::Binary(bytes.into()),
    };
    sink.send(msg).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
