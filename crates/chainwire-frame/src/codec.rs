use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::{frame_checksum, verify_checksum};
use crate::error::{FrameError, Result};
use crate::message::Message;

/// Length prefix: 8-byte big-endian payload length.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Checksum trailer: 4-byte big-endian CRC-32.
pub const CHECKSUM_SIZE: usize = 4;

/// Framing bytes around every payload.
pub const FRAME_OVERHEAD: usize = LENGTH_PREFIX_SIZE + CHECKSUM_SIZE;

/// Total wire size of a frame carrying `payload_len` bytes.
pub fn wire_size(payload_len: usize) -> usize {
    FRAME_OVERHEAD + payload_len
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────────┬──────────────────┬──────────────────────────────┐
/// │ Length (8B BE) │ Payload          │ CRC-32 (4B BE)               │
/// │ = L            │ (L bytes)        │ over Length ‖ Payload        │
/// └────────────────┴──────────────────┴──────────────────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    let length_bytes = (payload.len() as u64).to_be_bytes();
    let checksum = frame_checksum(&length_bytes, payload);

    dst.reserve(wire_size(payload.len()));
    dst.put_slice(&length_bytes);
    dst.put_slice(payload);
    dst.put_u32(checksum);
}

/// Encode a message as a complete frame.
pub fn encode_message(message: &Message, dst: &mut BytesMut) -> Result<()> {
    let payload = message.to_payload()?;
    encode_frame(&payload, dst);
    Ok(())
}

/// Decode one frame payload from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer and returns the
/// checksum-verified payload. On a checksum mismatch the frame bytes are
/// consumed as well; the buffer should not be decoded further.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None); // Need more data
    }

    let mut length_bytes = [0u8; LENGTH_PREFIX_SIZE];
    length_bytes.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
    let length = u64::from_be_bytes(length_bytes);
    config.check_payload_size(length)?;

    let payload_len = addressable_len(length)?;
    let total = payload_len
        .checked_add(FRAME_OVERHEAD)
        .ok_or(FrameError::PayloadTooLarge {
            size: length,
            max: (usize::MAX - FRAME_OVERHEAD) as u64,
        })?;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(LENGTH_PREFIX_SIZE);
    let payload = src.split_to(payload_len).freeze();
    let transmitted = src.get_u32();

    verify_checksum(&length_bytes, &payload, transmitted)?;
    Ok(Some(payload))
}

/// Decode one message from a buffer, see [`decode_frame`].
pub fn decode_message(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Message>> {
    match decode_frame(src, config)? {
        Some(payload) => Message::from_payload(&payload).map(Some),
        None => Ok(None),
    }
}

/// Convert a wire length into an in-memory length.
pub(crate) fn addressable_len(length: u64) -> Result<usize> {
    usize::try_from(length).map_err(|_| FrameError::PayloadTooLarge {
        size: length,
        max: usize::MAX as u64,
    })
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: unbounded.
    pub max_payload_size: Option<u64>,
}

impl FrameConfig {
    /// A config that rejects payloads longer than `max` bytes.
    pub fn with_max_payload(max: u64) -> Self {
        Self {
            max_payload_size: Some(max),
        }
    }

    pub(crate) fn check_payload_size(&self, size: u64) -> Result<()> {
        match self.max_payload_size {
            Some(max) if size > max => Err(FrameError::PayloadTooLarge { size, max }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;

    #[test]
    fn test_encode_layout() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf);

        assert_eq!(buf.len(), wire_size(5));
        assert_eq!(&buf[..8], &5u64.to_be_bytes());
        assert_eq!(&buf[8..13], b"hello");
        let expected = crc32fast::hash(&buf[..13]);
        assert_eq!(&buf[13..], &expected.to_be_bytes());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let message = Message::new(MessageType::Transaction, b"tx-bytes".to_vec());
        encode_message(&message, &mut buf).unwrap();

        let decoded = decode_message(&mut buf, &FrameConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(decoded, message);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_length() {
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, &FrameConfig::default()).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_payload_and_checksum() {
        let mut full = BytesMut::new();
        encode_frame(b"hello", &mut full);

        for cut in [LENGTH_PREFIX_SIZE + 2, LENGTH_PREFIX_SIZE + 5, full.len() - 1] {
            let mut buf = BytesMut::from(&full[..cut]);
            let result = decode_frame(&mut buf, &FrameConfig::default()).unwrap();
            assert!(result.is_none(), "cut at {cut} should need more data");
            assert_eq!(buf.len(), cut);
        }
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf);
        buf[LENGTH_PREFIX_SIZE] ^= 0x01;

        let result = decode_frame(&mut buf, &FrameConfig::default());
        assert!(matches!(result, Err(FrameError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u64(1024 * 1024 * 32); // 32 MiB

        let result = decode_frame(&mut buf, &FrameConfig::with_max_payload(16 * 1024 * 1024));
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut buf = BytesMut::new();
        buf.put_u64(1024 * 1024 * 32);

        let result = decode_frame(&mut buf, &FrameConfig::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf);
        encode_frame(b"second", &mut buf);

        let config = FrameConfig::default();
        let f1 = decode_frame(&mut buf, &config).unwrap().unwrap();
        assert_eq!(f1.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, &config).unwrap().unwrap();
        assert_eq!(f2.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf);
        assert_eq!(buf.len(), FRAME_OVERHEAD);

        let payload = decode_frame(&mut buf, &FrameConfig::default())
            .unwrap()
            .unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_malformed_payload_with_valid_checksum() {
        let mut buf = BytesMut::new();
        encode_frame(b"????", &mut buf);

        let result = decode_message(&mut buf, &FrameConfig::default());
        assert!(matches!(result, Err(FrameError::MalformedPayload(_))));
    }
}
