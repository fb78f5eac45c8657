//! Length-prefixed, CRC-32 checked message framing for chainwire peers.
//!
//! Every message travels as one frame:
//! - An 8-byte big-endian payload length
//! - The payload: a JSON object `{"Type": u8, "Data": base64}`
//! - A 4-byte big-endian CRC-32 (IEEE) over the length prefix and payload
//!
//! A frame is read start-to-finish before the next one; callers only ever
//! see verified, fully decoded messages or a typed error.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::MessageCodec;
pub use checksum::{frame_checksum, verify_checksum};
pub use codec::{
    decode_frame, decode_message, encode_frame, encode_message, wire_size, FrameConfig,
    CHECKSUM_SIZE, FRAME_OVERHEAD, LENGTH_PREFIX_SIZE,
};
pub use error::{FrameError, FrameSegment, Result};
pub use message::{Message, MessageType, BLOCK, CONSENSUS, TRANSACTION};
pub use reader::FrameReader;
pub use writer::FrameWriter;
