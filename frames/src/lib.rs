//! Relay envelope and protobuf codec for the drawing room WebSocket.
//!
//! This crate owns the wire representation shared by the relay server and
//! its clients. The relay only reads the envelope (`kind`, `to`) to route a
//! frame; the game payload in `data` stays opaque `serde_json::Value` and is
//! encoded over protobuf for compact binary transport.

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `kind` integer on the wire does not map to a known [`Kind`] variant.
    #[error("invalid frame kind: {0}")]
    InvalidKind(i32),
}

/// How the relay delivers a frame. The discriminant is the wire value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum Kind {
    /// To every peer in the room except the sender.
    Emit = 0,
    /// To every peer in the room, the sender included.
    Broadcast = 1,
    /// To the single peer named in `to`.
    Direct = 2,
    /// Server to room: the current member list.
    Roster = 3,
    /// Server to one peer: its assigned identity.
    Welcome = 4,
}

impl Kind {
    const ALL: [Self; 5] = [Self::Emit, Self::Broadcast, Self::Direct, Self::Roster, Self::Welcome];

    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    fn from_i32(value: i32) -> Result<Self, CodecError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_i32() == value)
            .ok_or(CodecError::InvalidKind(value))
    }

    /// Whether a client may send this kind. `Roster` and `Welcome` are
    /// produced by the relay only.
    #[must_use]
    pub fn is_peer_routable(self) -> bool {
        matches!(self, Self::Emit | Self::Broadcast | Self::Direct)
    }
}

/// A single message on the relay wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// Milliseconds since the Unix epoch when the frame was created.
    pub ts: i64,
    /// Room the frame belongs to. Stamped by the relay.
    pub room: Option<String>,
    /// Sending peer. Stamped by the relay; client values are overwritten.
    pub from: Option<String>,
    /// Target peer for [`Kind::Direct`].
    pub to: Option<String>,
    pub kind: Kind,
    /// Arbitrary JSON payload.
    pub data: Value,
}

impl Frame {
    #[must_use]
    pub fn new(id: impl Into<String>, ts: i64, kind: Kind, data: Value) -> Self {
        Self { id: id.into(), ts, room: None, from: None, to: None, kind, data }
    }

    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    #[must_use]
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    <WireFrame as From<&Frame>>::from(frame).encode_to_vec()
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::InvalidKind`] for out-of-range kind values.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    Frame::try_from(WireFrame::decode(bytes)?)
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(int64, tag = "2")]
    ts: i64,
    #[prost(string, optional, tag = "3")]
    room: Option<String>,
    #[prost(string, optional, tag = "4")]
    from: Option<String>,
    #[prost(string, optional, tag = "5")]
    to: Option<String>,
    #[prost(int32, tag = "6")]
    kind: i32,
    #[prost(message, optional, tag = "7")]
    data: Option<prost_types::Value>,
}

impl From<&Frame> for WireFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            id: frame.id.clone(),
            ts: frame.ts,
            room: frame.room.clone(),
            from: frame.from.clone(),
            to: frame.to.clone(),
            kind: frame.kind.as_i32(),
            data: Some(json::to_proto(&frame.data)),
        }
    }
}

impl TryFrom<WireFrame> for Frame {
    type Error = CodecError;

    fn try_from(wire: WireFrame) -> Result<Self, Self::Error> {
        let data = wire.data.as_ref().map_or_else(|| Value::Object(Map::new()), json::from_proto);
        Ok(Self {
            id: wire.id,
            ts: wire.ts,
            room: wire.room,
            from: wire.from,
            to: wire.to,
            kind: Kind::from_i32(wire.kind)?,
            data,
        })
    }
}

/// `serde_json::Value` <-> `google.protobuf.Value`.
mod json {
    use prost_types::value::Kind as Proto;
    use prost_types::{ListValue, NullValue, Struct};
    use serde_json::{Number, Value};

    /// Largest integer an `f64` holds exactly (2^53 - 1).
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    pub(super) fn to_proto(value: &Value) -> prost_types::Value {
        let kind = match value {
            Value::Null => Proto::NullValue(NullValue::NullValue.into()),
            Value::Bool(b) => Proto::BoolValue(*b),
            Value::Number(n) => n.as_f64().map_or(Proto::NullValue(NullValue::NullValue.into()), Proto::NumberValue),
            Value::String(s) => Proto::StringValue(s.clone()),
            Value::Array(items) => Proto::ListValue(ListValue { values: items.iter().map(to_proto).collect() }),
            Value::Object(map) => {
                Proto::StructValue(Struct { fields: map.iter().map(|(k, v)| (k.clone(), to_proto(v))).collect() })
            }
        };
        prost_types::Value { kind: Some(kind) }
    }

    pub(super) fn from_proto(value: &prost_types::Value) -> Value {
        match &value.kind {
            None | Some(Proto::NullValue(_)) => Value::Null,
            Some(Proto::BoolValue(b)) => Value::Bool(*b),
            Some(Proto::NumberValue(n)) => number(*n),
            Some(Proto::StringValue(s)) => Value::String(s.clone()),
            Some(Proto::ListValue(list)) => list.values.iter().map(from_proto).collect(),
            Some(Proto::StructValue(st)) => {
                Value::Object(st.fields.iter().map(|(k, v)| (k.clone(), from_proto(v))).collect())
            }
        }
    }

    /// Protobuf carries every number as a double. Whole values in the exactly
    /// representable range come back as JSON integers so that payload fields
    /// typed as integers (gesture ids, counts) still deserialize.
    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    fn number(v: f64) -> Value {
        if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
            return Value::from(v as i64);
        }
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
