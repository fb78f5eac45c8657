use std::fmt;

/// Wire segment of a frame, in the order it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSegment {
    /// The 8-byte big-endian payload length.
    Length,
    /// The payload itself.
    Payload,
    /// The 4-byte big-endian CRC-32 trailer.
    Checksum,
}

impl fmt::Display for FrameSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameSegment::Length => "length prefix",
            FrameSegment::Payload => "payload",
            FrameSegment::Checksum => "checksum",
        })
    }
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream ended before a segment was fully delivered.
    #[error("incomplete frame: stream closed after {received} of {expected} {segment} bytes")]
    IncompleteFrame {
        segment: FrameSegment,
        expected: u64,
        received: u64,
    },

    /// The transmitted CRC-32 does not match the one computed over length and payload.
    #[error("checksum mismatch (transmitted {expected:#010x}, computed {actual:#010x})")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The payload passed the checksum but is not a valid message encoding.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// The peer stopped accepting bytes while a frame was being written.
    #[error("connection closed while writing frame")]
    ConnectionClosed,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True when the stream closed exactly on a frame boundary.
    ///
    /// Readers use this to tell an orderly disconnect from a frame cut short.
    pub fn is_clean_close(&self) -> bool {
        matches!(
            self,
            FrameError::IncompleteFrame {
                segment: FrameSegment::Length,
                received: 0,
                ..
            }
        )
    }

    /// True for failures that indicate corruption or tampering on the wire.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, FrameError::ChecksumMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_close_only_at_frame_boundary() {
        let boundary = FrameError::IncompleteFrame {
            segment: FrameSegment::Length,
            expected: 8,
            received: 0,
        };
        let mid_length = FrameError::IncompleteFrame {
            segment: FrameSegment::Length,
            expected: 8,
            received: 3,
        };
        let mid_payload = FrameError::IncompleteFrame {
            segment: FrameSegment::Payload,
            expected: 5,
            received: 0,
        };

        assert!(boundary.is_clean_close());
        assert!(!mid_length.is_clean_close());
        assert!(!mid_payload.is_clean_close());
    }

    #[test]
    fn display_names_segment() {
        let err = FrameError::IncompleteFrame {
            segment: FrameSegment::Checksum,
            expected: 4,
            received: 1,
        };
        assert_eq!(
            err.to_string(),
            "incomplete frame: stream closed after 1 of 4 checksum bytes"
        );
    }
}
