use std::io::{self, ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::Message;

const STAGING_CAPACITY: usize = 8 * 1024;

/// Blocking sender half of a peer stream.
///
/// A frame that fails the payload bound or serialization writes nothing.
/// An I/O error part way through a frame can leave a partial frame on the
/// stream; drop the stream after any send error.
pub struct FrameWriter<T> {
    stream: T,
    staging: BytesMut,
    config: FrameConfig,
    frames_sent: u64,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(stream: T) -> Self {
        Self::with_config(stream, FrameConfig::default())
    }

    pub fn with_config(stream: T, config: FrameConfig) -> Self {
        Self {
            stream,
            staging: BytesMut::with_capacity(STAGING_CAPACITY),
            config,
            frames_sent: 0,
        }
    }

    /// Serialize `message` and send it as one frame.
    pub fn send_message(&mut self, message: &Message) -> Result<()> {
        let payload = message.to_payload()?;
        self.send(&payload)
    }

    /// Send several messages back to back with a single flush.
    ///
    /// Nothing is written if any message fails to serialize or exceeds the
    /// configured payload bound.
    pub fn send_batch<'a, I>(&mut self, messages: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Message>,
    {
        self.staging.clear();
        let mut staged = 0u64;
        for message in messages {
            let payload = message.to_payload()?;
            self.config.check_payload_size(payload.len() as u64)?;
            encode_frame(&payload, &mut self.staging);
            staged += 1;
        }
        self.write_staged()?;
        self.frames_sent += staged;
        Ok(())
    }

    /// Frame an already serialized payload and send it.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.config.check_payload_size(payload.len() as u64)?;
        self.staging.clear();
        encode_frame(payload, &mut self.staging);
        self.write_staged()?;
        self.frames_sent += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        retry_transient(|| self.stream.flush()).map_err(FrameError::Io)
    }

    /// Frames fully written so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn get_ref(&self) -> &T {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.stream
    }

    pub fn into_inner(self) -> T {
        self.stream
    }

    pub fn set_max_payload_size(&mut self, max_payload_size: Option<u64>) {
        self.config.max_payload_size = max_payload_size;
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn write_staged(&mut self) -> Result<()> {
        let mut remaining = &self.staging[..];
        while !remaining.is_empty() {
            match retry_transient(|| self.stream.write(remaining)) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => remaining = &remaining[n..],
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.flush()
    }
}

/// Repeat `op` while it fails with `Interrupted` or `WouldBlock`.
fn retry_transient<R>(mut op: impl FnMut() -> io::Result<R>) -> io::Result<R> {
    loop {
        match op() {
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
            other => return other,
        }
    }
}
