use std::sync::atomic::{AtomicU64, Ordering};

use chainwire_frame::{FrameError, MessageType};

/// Counters shared by every session of a node.
#[derive(Debug, Default)]
pub struct NodeStats {
    connections: AtomicU64,
    rejected_connections: AtomicU64,
    blocks: AtomicU64,
    transactions: AtomicU64,
    consensus: AtomicU64,
    unrecognized: AtomicU64,
    dispatch_failures: AtomicU64,
    checksum_mismatches: AtomicU64,
    malformed_payloads: AtomicU64,
    incomplete_frames: AtomicU64,
    oversized_frames: AtomicU64,
    io_errors: AtomicU64,
}

/// Point-in-time copy of [`NodeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connections: u64,
    /// Accepted connections dropped because their session could not be started.
    pub rejected_connections: u64,
    pub blocks: u64,
    pub transactions: u64,
    pub consensus: u64,
    pub unrecognized: u64,
    pub dispatch_failures: u64,
    pub checksum_mismatches: u64,
    pub malformed_payloads: u64,
    pub incomplete_frames: u64,
    pub oversized_frames: u64,
    pub io_errors: u64,
}

impl StatsSnapshot {
    /// Messages decoded, whatever their kind.
    pub fn messages(&self) -> u64 {
        self.blocks + self.transactions + self.consensus + self.unrecognized
    }
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_connection(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_message(&self, kind: MessageType) {
        let counter = match kind {
            MessageType::Block => &self.blocks,
            MessageType::Transaction => &self.transactions,
            MessageType::Consensus => &self.consensus,
            MessageType::Unrecognized(_) => &self.unrecognized,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a frame error that ended a session. Clean closes are not counted.
    pub(crate) fn record_frame_error(&self, err: &FrameError) {
        let counter = match err {
            FrameError::IncompleteFrame { .. } if err.is_clean_close() => return,
            FrameError::IncompleteFrame { .. } => &self.incomplete_frames,
            FrameError::ChecksumMismatch { .. } => &self.checksum_mismatches,
            FrameError::MalformedPayload(_) => &self.malformed_payloads,
            FrameError::PayloadTooLarge { .. } => &self.oversized_frames,
            FrameError::ConnectionClosed | FrameError::Io(_) => &self.io_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            blocks: self.blocks.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
            consensus: self.consensus.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            checksum_mismatches: self.checksum_mismatches.load(Ordering::Relaxed),
            malformed_payloads: self.malformed_payloads.load(Ordering::Relaxed),
            incomplete_frames: self.incomplete_frames.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
        }
    }
}
