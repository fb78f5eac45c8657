//! Application messages carried inside a frame payload.
//!
//! The payload is a JSON object with exactly two fields:
//!
//! ```text
//! {"Type": <u8>, "Data": "<standard base64>"}
//! ```
//!
//! `Type` selects the message kind and `Data` is opaque to this crate.
//! Field names are matched without regard to ASCII case on decode.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FrameError, Result};

/// Discriminant of a block announcement.
pub const BLOCK: u8 = 0;
/// Discriminant of a transaction.
pub const TRANSACTION: u8 = 1;
/// Discriminant of a consensus message.
pub const CONSENSUS: u8 = 2;

/// Kind of a decoded message.
///
/// Discriminants outside the known set are kept as [`MessageType::Unrecognized`]
/// rather than rejected; routing them is the dispatcher's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Block,
    Transaction,
    Consensus,
    Unrecognized(u8),
}

impl MessageType {
    /// Raw wire discriminant.
    pub fn as_u8(self) -> u8 {
        match self {
            MessageType::Block => BLOCK,
            MessageType::Transaction => TRANSACTION,
            MessageType::Consensus => CONSENSUS,
            MessageType::Unrecognized(raw) => raw,
        }
    }

    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::Block => "BLOCK",
            MessageType::Transaction => "TRANSACTION",
            MessageType::Consensus => "CONSENSUS",
            MessageType::Unrecognized(_) => "UNRECOGNIZED",
        }
    }

    /// Returns true for the three discriminants this protocol defines.
    pub fn is_known(self) -> bool {
        !matches!(self, MessageType::Unrecognized(_))
    }
}

impl From<u8> for MessageType {
    fn from(raw: u8) -> Self {
        match raw {
            BLOCK => MessageType::Block,
            TRANSACTION => MessageType::Transaction,
            CONSENSUS => MessageType::Consensus,
            other => MessageType::Unrecognized(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(kind: MessageType) -> Self {
        kind.as_u8()
    }
}

/// A decoded application message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageType,
    data: Bytes,
}

impl Message {
    /// Create a message. The kind is normalized so that
    /// `Unrecognized(0)` and `Block` compare equal after construction.
    pub fn new(kind: impl Into<MessageType>, data: impl Into<Bytes>) -> Self {
        let kind = MessageType::from(kind.into().as_u8());
        Self {
            kind,
            data: data.into(),
        }
    }

    pub fn kind(&self) -> MessageType {
        self.kind
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Split the message into its kind and data.
    pub fn into_parts(self) -> (MessageType, Bytes) {
        (self.kind, self.data)
    }

    /// Parse a checksum-verified frame payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let wire: WireMessage =
            serde_json::from_slice(payload).map_err(FrameError::MalformedPayload)?;
        Ok(Self::new(wire.kind, wire.data))
    }

    /// Serialize this message into a frame payload.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        let wire = WireMessageRef {
            kind: self.kind.as_u8(),
            data: &self.data,
        };
        serde_json::to_vec(&wire).map_err(FrameError::MalformedPayload)
    }
}

/// Field names match regardless of ASCII case, so `Type`, `type` and `TYPE`
/// all select the kind. Unknown and repeated fields are errors.
struct WireMessage {
    kind: u8,
    data: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(transparent)]
struct WireData(#[serde(deserialize_with = "deserialize_base64")] Vec<u8>);

const WIRE_FIELDS: &[&str] = &["Type", "Data"];

impl<'de> Deserialize<'de> for WireMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(WireMessageVisitor)
    }
}

struct WireMessageVisitor;

impl<'de> Visitor<'de> for WireMessageVisitor {
    type Value = WireMessage;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object with Type and Data fields")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<WireMessage, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut kind: Option<u8> = None;
        let mut data: Option<Vec<u8>> = None;

        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case("type") {
                if kind.is_some() {
                    return Err(de::Error::duplicate_field("Type"));
                }
                kind = Some(map.next_value()?);
            } else if key.eq_ignore_ascii_case("data") {
                if data.is_some() {
                    return Err(de::Error::duplicate_field("Data"));
                }
                data = Some(map.next_value::<WireData>()?.0);
            } else {
                return Err(de::Error::unknown_field(&key, WIRE_FIELDS));
            }
        }

        let kind = kind.ok_or_else(|| <A::Error as de::Error>::missing_field("Type"))?;
        let data = data.ok_or_else(|| <A::Error as de::Error>::missing_field("Data"))?;
        Ok(WireMessage { kind, data })
    }
}

#[derive(Serialize)]
struct WireMessageRef<'a> {
    #[serde(rename = "Type")]
    kind: u8,
    #[serde(rename = "Data", serialize_with = "serialize_base64")]
    data: &'a [u8],
}

fn serialize_base64<S: Serializer>(
    data: &&[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

// `null` is what an absent byte slice serializes to on the sending side.
fn deserialize_base64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<u8>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(encoded) => STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom),
        None => Ok(Vec::new()),
    }
}
