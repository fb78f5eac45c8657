//! Message dispatch boundary.
//!
//! A session hands every decoded [`Message`] to a [`Dispatcher`] by value.
//! Per-kind handling (block import, mempool admission, consensus) lives
//! behind this trait.

use std::net::SocketAddr;

use chainwire_frame::Message;
use tracing::info;

use crate::error::DispatchError;

/// Identity of the peer a message arrived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerContext {
    pub peer_id: String,
    pub remote_addr: Option<SocketAddr>,
}

impl PeerContext {
    pub fn new(peer_id: impl Into<String>, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            peer_id: peer_id.into(),
            remote_addr,
        }
    }
}

/// Consumes decoded messages.
///
/// Called from one thread per peer, so implementations must be `Send + Sync`.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, peer: &PeerContext, message: Message) -> Result<(), DispatchError>;
}

impl<F> Dispatcher for F
where
    F: Fn(&PeerContext, Message) -> Result<(), DispatchError> + Send + Sync,
{
    fn dispatch(&self, peer: &PeerContext, message: Message) -> Result<(), DispatchError> {
        self(peer, message)
    }
}

/// Logs every message. Kinds outside the protocol are reported as
/// [`DispatchError::Unhandled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

impl Dispatcher for TracingDispatcher {
    fn dispatch(&self, peer: &PeerContext, message: Message) -> Result<(), DispatchError> {
        let (kind, data) = message.into_parts();
        if !kind.is_known() {
            return Err(DispatchError::Unhandled(kind.as_u8()));
        }
        info!(
            peer = %peer.peer_id,
            kind = kind.name(),
            discriminant = kind.as_u8(),
            len = data.len(),
            "message received"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chainwire_frame::MessageType;

    use super::*;

    #[test]
    fn closures_are_dispatchers() {
        let seen = Mutex::new(Vec::new());
        let dispatcher = |peer: &PeerContext, message: Message| -> Result<(), DispatchError> {
            seen.lock()
                .unwrap()
                .push((peer.peer_id.clone(), message.kind()));
            Ok(())
        };

        let peer = PeerContext::new("peer-1", None);
        dispatcher
            .dispatch(&peer, Message::new(MessageType::Block, Vec::<u8>::new()))
            .unwrap();
        dispatcher
            .dispatch(&peer, Message::new(7u8, Vec::<u8>::new()))
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("peer-1".to_string(), MessageType::Block),
                ("peer-1".to_string(), MessageType::Unrecognized(7)),
            ]
        );
    }

    #[test]
    fn tracing_dispatcher_reports_unrecognized_kinds() {
        let peer = PeerContext::new("peer-9", None);
        let err = TracingDispatcher
            .dispatch(&peer, Message::new(200u8, Vec::<u8>::new()))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unhandled(200)));

        TracingDispatcher
            .dispatch(&peer, Message::new(MessageType::Consensus, b"vote".to_vec()))
            .unwrap();
    }
}
