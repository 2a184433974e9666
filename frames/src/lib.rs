//! Wire frames shared by the room server and its clients.
//!
//! Every message on the room channel is a [`Frame`]. A frame travels either as
//! JSON text or as a protobuf message; [`Encoding`] picks the representation
//! and [`decode_payload`] reports which one a peer used so a reply can mirror it.
//! Payloads stay schemaless (`serde_json::Value`) so the room snapshot shape is
//! owned by the `room` crate, not by the transport.

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned when a payload cannot be turned into a [`Frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The bytes are not a valid protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Protobuf(#[from] prost::DecodeError),
    /// The text is not a valid JSON frame.
    #[error("failed to decode json frame: {0}")]
    Json(#[from] serde_json::Error),
    /// The `status` integer on the wire does not map to a known [`Status`].
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
}

/// Lifecycle position of a frame in a request/response exchange.
///
/// Every exchange is `request -> done` or `request -> error`. Server pushes
/// (snapshots, chat) are bare `request` frames with no parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Request,
    Done,
    Error,
}

impl Status {
    /// Wire enum value for this status.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Request => WireStatus::Request as i32,
            Self::Done => WireStatus::Done as i32,
            Self::Error => WireStatus::Error as i32,
        }
    }

    fn from_i32(value: i32) -> Result<Self, CodecError> {
        match WireStatus::try_from(value) {
            Ok(WireStatus::Request) => Ok(Self::Request),
            Ok(WireStatus::Done) => Ok(Self::Done),
            Ok(WireStatus::Error) => Ok(Self::Error),
            Err(_) => Err(CodecError::InvalidStatus(value)),
        }
    }

    /// Terminal statuses close a request.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// A single message on the room channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// Request this frame answers, if any.
    pub parent_id: Option<String>,
    /// Milliseconds since the Unix epoch at creation.
    pub ts: i64,
    /// Room the frame concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Sender label (viewer name or `server`).
    pub from: Option<String>,
    /// Namespaced operation, e.g. `"role:move"`.
    pub syscall: String,
    pub status: Status,
    /// Flat JSON object payload.
    pub data: Value,
}

impl Frame {
    /// String field from the payload.
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Numeric field from the payload.
    #[must_use]
    pub fn data_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }
}

// =============================================================================
// ENCODINGS
// =============================================================================

/// How a frame is represented on a websocket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8 JSON in a text message.
    #[default]
    Json,
    /// Protobuf `WireFrame` in a binary message.
    Protobuf,
}

/// An encoded frame, ready to be wrapped in a transport message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Encoding {
    /// Encode `frame` in this representation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if JSON serialization fails.
    pub fn encode(self, frame: &Frame) -> Result<Payload, CodecError> {
        match self {
            Self::Json => Ok(Payload::Text(serde_json::to_string(frame)?)),
            Self::Protobuf => Ok(Payload::Binary(encode_frame(frame))),
        }
    }
}

/// Decode a transport payload and report which encoding the sender used.
///
/// # Errors
///
/// Returns a [`CodecError`] if the payload is malformed in its own encoding.
pub fn decode_payload(payload: &Payload) -> Result<(Frame, Encoding), CodecError> {
    match payload {
        Payload::Text(text) => Ok((serde_json::from_str(text)?, Encoding::Json)),
        Payload::Binary(bytes) => Ok((decode_frame(bytes)?, Encoding::Protobuf)),
    }
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = WireFrame {
        id: frame.id.clone(),
        parent_id: frame.parent_id.clone(),
        ts: frame.ts,
        room: frame.room.clone(),
        from: frame.from.clone(),
        syscall: frame.syscall.clone(),
        status: frame.status.as_i32(),
        data: Some(json_to_proto(&frame.data)),
    };

    let mut out = Vec::with_capacity(wire.encoded_len());
    // A growable Vec never reports BufferTooSmall.
    wire.encode(&mut out).unwrap_or_default();
    out
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Protobuf`] for malformed bytes and
/// [`CodecError::InvalidStatus`] for unknown status values.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    Ok(Frame {
        id: wire.id,
        parent_id: wire.parent_id,
        ts: wire.ts,
        room: wire.room,
        from: wire.from,
        syscall: wire.syscall,
        status: Status::from_i32(wire.status)?,
        data: wire
            .data
            .map_or(Value::Object(Map::new()), |v| proto_to_json(&v)),
    })
}

fn json_to_proto(value: &Value) -> prost_types::Value {
    use prost_types::value::Kind;

    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(v) => Kind::BoolValue(*v),
        Value::Number(v) => Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => Kind::StringValue(v.clone()),
        Value::Array(items) => Kind::ListValue(prost_types::ListValue { values: items.iter().map(json_to_proto).collect() }),
        Value::Object(fields) => Kind::StructValue(prost_types::Struct {
            fields: fields
                .iter()
                .map(|(k, v)| (k.clone(), json_to_proto(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn proto_to_json(value: &prost_types::Value) -> Value {
    use prost_types::value::Kind;

    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        Kind::NullValue(_) => Value::Null,
        Kind::NumberValue(v) => number_to_json(*v),
        Kind::StringValue(v) => Value::String(v.clone()),
        Kind::BoolValue(v) => Value::Bool(*v),
        Kind::StructValue(s) => Value::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json(v)))
                .collect(),
        ),
        Kind::ListValue(list) => Value::Array(list.values.iter().map(proto_to_json).collect()),
    }
}

/// Protobuf carries every number as a double. Whole values come back as
/// integers so revisions and pixel coordinates survive a round trip unchanged.
#[allow(clippy::cast_possible_truncation)]
fn number_to_json(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        return Value::from(v as i64);
    }
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, optional, tag = "4")]
    room: Option<String>,
    #[prost(string, optional, tag = "5")]
    from: Option<String>,
    #[prost(string, tag = "6")]
    syscall: String,
    #[prost(enumeration = "WireStatus", tag = "7")]
    status: i32,
    #[prost(message, optional, tag = "8")]
    data: Option<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireStatus {
    Request = 0,
    Done = 1,
    Error = 2,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
