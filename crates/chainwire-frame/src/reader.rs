use std::io::{ErrorKind, Read};

use bytes::Bytes;
use tracing::trace;

use crate::checksum::verify_checksum;
use crate::codec::{addressable_len, FrameConfig, CHECKSUM_SIZE, LENGTH_PREFIX_SIZE};
use crate::error::{FrameError, FrameSegment, Result};
use crate::message::Message;

const INITIAL_PAYLOAD_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Each call consumes exactly one frame: the length prefix, `length` payload
/// bytes and the checksum trailer, in that order. Short reads are retried
/// until the segment is complete or the stream ends, so callers never see a
/// partial frame. The reader owns its stream; one stream, one reader.
///
/// After any error the stream position is no longer on a frame boundary and
/// the reader should be dropped.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next frame and return its checksum-verified payload (blocking).
    pub fn read_payload(&mut self) -> Result<Bytes> {
        let mut length_bytes = [0u8; LENGTH_PREFIX_SIZE];
        self.read_segment(&mut length_bytes, FrameSegment::Length)?;
        let length = u64::from_be_bytes(length_bytes);
        self.config.check_payload_size(length)?;

        let payload = self.read_payload_bytes(length)?;

        let mut checksum_bytes = [0u8; CHECKSUM_SIZE];
        self.read_segment(&mut checksum_bytes, FrameSegment::Checksum)?;
        let transmitted = u32::from_be_bytes(checksum_bytes);

        verify_checksum(&length_bytes, &payload, transmitted)?;
        trace!(len = length, "frame verified");
        Ok(Bytes::from(payload))
    }

    /// Read, verify and decode the next message (blocking).
    pub fn read_message(&mut self) -> Result<Message> {
        let payload = self.read_payload()?;
        Message::from_payload(&payload)
    }

    /// Fill a fixed-size segment completely.
    fn read_segment(&mut self, buf: &mut [u8], segment: FrameSegment) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(FrameError::IncompleteFrame {
                        segment,
                        expected: buf.len() as u64,
                        received: filled as u64,
                    })
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Read `length` payload bytes, growing the buffer only as bytes arrive.
    fn read_payload_bytes(&mut self, length: u64) -> Result<Vec<u8>> {
        let expected = addressable_len(length)?;
        let mut payload = Vec::with_capacity(expected.min(INITIAL_PAYLOAD_CAPACITY));
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while payload.len() < expected {
            let want = (expected - payload.len()).min(READ_CHUNK_SIZE);
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => {
                    return Err(FrameError::IncompleteFrame {
                        segment: FrameSegment::Payload,
                        expected: length,
                        received: payload.len() as u64,
                    })
                }
                Ok(n) => payload.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(payload)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frames.
    pub fn set_max_payload_size(&mut self, max_payload_size: Option<u64>) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}


#[cfg(test)]
mod proptests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;
    use crate::codec::FRAME_OVERHEAD;
    use crate::message::MessageType;
    use crate::writer::FrameWriter;

    proptest! {
        #[test]
        fn known_kinds_roundtrip_any_data(
            kind in 0u8..=2,
            data in prop::collection::vec(any::<u8>(), 0..2048),
        ) {
            let sent = Message::new(kind, data.clone());
            let mut writer = FrameWriter::new(Vec::new());
            writer.send_message(&sent).unwrap();
            let wire = writer.into_inner();

            let mut reader = FrameReader::new(Cursor::new(wire));
            let received = reader.read_message().unwrap();

            prop_assert!(received.kind().is_known());
            prop_assert_eq!(received.kind().as_u8(), kind);
            prop_assert_eq!(received.data().as_ref(), data.as_slice());
            prop_assert!(reader.read_message().unwrap_err().is_clean_close());
        }

        #[test]
        fn any_kind_survives_a_batch(
            kinds in prop::collection::vec(any::<u8>(), 1..8),
            data in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let sent: Vec<Message> = kinds
                .iter()
                .map(|&kind| Message::new(kind, data.clone()))
                .collect();
            let mut writer = FrameWriter::new(Vec::new());
            writer.send_batch(&sent).unwrap();
            let wire = writer.into_inner();

            let mut reader = FrameReader::new(Cursor::new(wire));
            for (expected, &kind) in sent.iter().zip(&kinds) {
                let received = reader.read_message().unwrap();
                prop_assert_eq!(&received, expected);
                prop_assert_eq!(received.kind(), MessageType::from(kind));
            }
        }

        #[test]
        fn any_flipped_bit_is_detected(
            data in prop::collection::vec(any::<u8>(), 0..256),
            bit in any::<prop::sample::Index>(),
        ) {
            let mut writer = FrameWriter::new(Vec::new());
            writer.send_message(&Message::new(MessageType::Block, data)).unwrap();
            let mut wire = writer.into_inner();
            prop_assert!(wire.len() > FRAME_OVERHEAD);

            // Flip a bit outside the length prefix so the frame size stays put.
            let body_bits = (wire.len() - LENGTH_PREFIX_SIZE) * 8;
            let flipped = LENGTH_PREFIX_SIZE * 8 + bit.index(body_bits);
            wire[flipped / 8] ^= 1 << (flipped % 8);

            let err = FrameReader::new(Cursor::new(wire)).read_message().unwrap_err();
            prop_assert!(
                matches!(err, FrameError::ChecksumMismatch { .. }),
                "expected checksum mismatch, got {}",
                err
            );
        }
    }
}
