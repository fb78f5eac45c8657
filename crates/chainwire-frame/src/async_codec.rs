//! `tokio_util` codec for async peers.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{
    decode_message, encode_frame, FrameConfig, CHECKSUM_SIZE, LENGTH_PREFIX_SIZE,
};
use crate::error::{FrameError, FrameSegment, Result};
use crate::message::Message;

/// Frames [`Message`]s for `FramedRead`/`FramedWrite`.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    config: FrameConfig,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        decode_message(src, &self.config)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(incomplete_at_eof(src)),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&Message>>::encode(self, &item, dst)
    }
}

impl Encoder<&Message> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<()> {
        let payload = item.to_payload()?;
        self.config.check_payload_size(payload.len() as u64)?;
        encode_frame(&payload, dst);
        Ok(())
    }
}

/// Describe which segment a buffer left over at end of stream stops in.
fn incomplete_at_eof(src: &BytesMut) -> FrameError {
    let buffered = src.len() as u64;
    if src.len() < LENGTH_PREFIX_SIZE {
        return FrameError::IncompleteFrame {
            segment: FrameSegment::Length,
            expected: LENGTH_PREFIX_SIZE as u64,
            received: buffered,
        };
    }

    let mut length_bytes = [0u8; LENGTH_PREFIX_SIZE];
    length_bytes.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
    let length = u64::from_be_bytes(length_bytes);
    let after_prefix = buffered - LENGTH_PREFIX_SIZE as u64;

    if after_prefix < length {
        FrameError::IncompleteFrame {
            segment: FrameSegment::Payload,
            expected: length,
            received: after_prefix,
        }
    } else {
        FrameError::IncompleteFrame {
            segment: FrameSegment::Checksum,
            expected: CHECKSUM_SIZE as u64,
            received: after_prefix - length,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::message::MessageType;

    #[tokio::test]
    async fn framed_roundtrip_preserves_order() {
        let sent = vec![
            Message::new(MessageType::Block, b"b".to_vec()),
            Message::new(MessageType::Transaction, b"t".to_vec()),
            Message::new(MessageType::Unrecognized(42), Vec::<u8>::new()),
        ];

        let mut framed = FramedWrite::new(Vec::new(), MessageCodec::new());
        for message in &sent {
            framed.send(message).await.unwrap();
        }
        let wire = framed.into_inner();

        let mut reader = FramedRead::new(wire.as_slice(), MessageCodec::new());
        for expected in &sent {
            let message = reader.next().await.unwrap().unwrap();
            assert_eq!(&message, expected);
        }
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn truncated_stream_is_incomplete() {
        let mut wire = BytesMut::new();
        encode_frame(br#"{"Type":2,"Data":"dm90ZQ=="}"#, &mut wire);
        wire.truncate(wire.len() - 1);

        let mut reader = FramedRead::new(&wire[..], MessageCodec::new());
        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteFrame {
                segment: FrameSegment::Checksum,
                expected: 4,
                received: 3,
            }
        ));
    }

    #[test]
    fn eof_inside_payload_reports_payload_segment() {
        let mut wire = BytesMut::new();
        encode_frame(b"0123456789", &mut wire);
        wire.truncate(LENGTH_PREFIX_SIZE + 9);

        let err = MessageCodec::new().decode_eof(&mut wire).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteFrame {
                segment: FrameSegment::Payload,
                expected: 10,
                received: 9,
            }
        ));
    }

    #[test]
    fn encoder_honours_max_payload() {
        let mut codec = MessageCodec::with_config(FrameConfig::with_max_payload(8));
        let mut dst = BytesMut::new();
        let message = Message::new(MessageType::Block, b"far too long for eight".to_vec());

        let err = Encoder::<&Message>::encode(&mut codec, &message, &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(dst.is_empty());
    }
}
