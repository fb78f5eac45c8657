use std::net::{TcpStream, ToSocketAddrs};

use chainwire_frame::{FrameConfig, FrameWriter};
use tracing::debug;

use crate::error::Result;

/// Connect to a listening node as a sender.
pub fn connect(addr: impl ToSocketAddrs) -> Result<FrameWriter<TcpStream>> {
    connect_with_config(addr, FrameConfig::default())
}

/// Connect with explicit frame configuration.
pub fn connect_with_config(
    addr: impl ToSocketAddrs,
    config: FrameConfig,
) -> Result<FrameWriter<TcpStream>> {
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    debug!(remote = ?stream.peer_addr().ok(), "connected to node");
    Ok(FrameWriter::with_config(stream, config))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use chainwire_frame::{FrameError, FrameReader, Message, MessageType};

    use super::*;
    use crate::error::NodeError;

    #[test]
    fn sends_frames_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept should succeed");
            let mut reader = FrameReader::new(stream);
            let message = reader.read_message().expect("message should decode");
            assert_eq!(message.kind(), MessageType::Consensus);
            assert_eq!(message.data().as_ref(), b"vote");
        });

        let mut writer = connect(addr).expect("client should connect");
        writer
            .send_message(&Message::new(MessageType::Consensus, b"vote".to_vec()))
            .expect("send should succeed");
        server.join().expect("server thread should finish");
    }

    #[test]
    fn configured_limit_applies_to_sends() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");

        let mut writer =
            connect_with_config(addr, FrameConfig::with_max_payload(8)).expect("should connect");
        let err = writer
            .send_message(&Message::new(MessageType::Block, vec![0u8; 64]))
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn refused_connection_is_io_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
            listener.local_addr().expect("listener should have an address")
        };
        let err = connect(addr).err().expect("connect should fail");
        assert!(matches!(err, NodeError::Io(_)));
    }
}
