//! CRC-32 (IEEE 802.3) integrity check over the length prefix and payload.
//!
//! The trailer never covers itself: only `length_bytes || payload` is hashed.

use crc32fast::Hasher;

use crate::error::{FrameError, Result};

/// Compute the frame checksum for an encoded length prefix and its payload.
pub fn frame_checksum(length_bytes: &[u8; 8], payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(length_bytes);
    hasher.update(payload);
    hasher.finalize()
}

/// Verify a transmitted checksum against the one recomputed locally.
pub fn verify_checksum(length_bytes: &[u8; 8], payload: &[u8], transmitted: u32) -> Result<()> {
    let actual = frame_checksum(length_bytes, payload);
    if actual != transmitted {
        return Err(FrameError::ChecksumMismatch {
            expected: transmitted,
            actual,
        });
    }
    Ok(())
}
