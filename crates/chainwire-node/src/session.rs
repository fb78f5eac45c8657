//! Per-peer receive loop.
//!
//! A session reads one frame at a time from its stream, decodes it and hands
//! the message to the dispatcher before reading the next. The first frame
//! error ends the session; the stream is never resynchronised.

use std::io::Read;
use std::sync::Arc;

use chainwire_frame::{FrameConfig, FrameError, FrameReader};
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, PeerContext};
use crate::stats::NodeStats;

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The peer closed the stream on a frame boundary.
    Closed,
    /// A frame could not be read, verified or decoded.
    Failed(FrameError),
}

impl SessionEnd {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Outcome of [`PeerSession::run`].
#[derive(Debug)]
pub struct SessionSummary {
    pub peer_id: String,
    /// Messages decoded and dispatched, including ones the dispatcher rejected.
    pub messages: u64,
    pub end: SessionEnd,
}

/// Receive side of one peer connection.
pub struct PeerSession<T> {
    context: PeerContext,
    reader: FrameReader<T>,
    stats: Arc<NodeStats>,
}

impl<T: Read> PeerSession<T> {
    /// Counts go to `stats`, usually shared with the node and its other sessions.
    pub fn new(
        context: PeerContext,
        stream: T,
        config: FrameConfig,
        stats: Arc<NodeStats>,
    ) -> Self {
        Self {
            context,
            reader: FrameReader::with_config(stream, config),
            stats,
        }
    }

    pub fn context(&self) -> &PeerContext {
        &self.context
    }

    /// Read and dispatch messages until the stream ends or a frame fails.
    pub fn run(mut self, dispatcher: &dyn Dispatcher) -> SessionSummary {
        let peer_id = self.context.peer_id.clone();
        debug!(peer = %peer_id, remote = ?self.context.remote_addr, "session started");

        let mut messages = 0u64;
        let end = loop {
            let message = match self.reader.read_message() {
                Ok(message) => message,
                Err(err) => break self.finish(err),
            };
            messages += 1;

            let kind = message.kind();
            self.stats.record_message(kind);
            if let Err(err) = dispatcher.dispatch(&self.context, message) {
                self.stats.record_dispatch_failure();
                warn!(
                    peer = %peer_id,
                    kind = kind.name(),
                    discriminant = kind.as_u8(),
                    error = %err,
                    "dispatch failed"
                );
            }
        };

        info!(peer = %peer_id, messages, clean = end.is_clean(), "session ended");
        SessionSummary {
            peer_id,
            messages,
            end,
        }
    }

    fn finish(&self, err: FrameError) -> SessionEnd {
        let peer = &self.context.peer_id;
        self.stats.record_frame_error(&err);

        if err.is_clean_close() {
            debug!(peer = %peer, "peer closed connection");
            return SessionEnd::Closed;
        }

        if err.is_integrity_failure() {
            warn!(peer = %peer, error = %err, "frame integrity check failed");
        } else {
            warn!(peer = %peer, error = %err, "frame read failed");
        }
        SessionEnd::Failed(err)
    }
}
