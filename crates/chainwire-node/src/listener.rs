use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dispatch::PeerContext;
use crate::error::{NodeError, Result};

/// Listens for and accepts peer connections.
pub struct NodeListener {
    socket: TcpListener,
    next_peer_id: AtomicU64,
}

impl NodeListener {
    /// Bind to a TCP address such as `127.0.0.1:7420`.
    pub fn bind(addr: &str) -> Result<Self> {
        let socket = TcpListener::bind(addr).map_err(|source| NodeError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self {
            socket,
            next_peer_id: AtomicU64::new(1),
        })
    }

    /// Accept next connection and assign an auto-generated peer id.
    pub fn accept(&self) -> Result<(PeerContext, TcpStream)> {
        let (stream, remote) = self.socket.accept()?;
        let id = self.next_peer_id.fetch_add(1, Ordering::Relaxed);
        Ok((PeerContext::new(format!("peer-{id}"), Some(remote)), stream))
    }

    /// Switch `accept` between blocking and polling.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.socket.set_nonblocking(nonblocking)?;
        Ok(())
    }

    /// Bound address, with the OS-assigned port when bound to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::connector::connect;

    #[test]
    fn accepts_multiple_sequential_connections() {
        let listener = NodeListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");

        let server = thread::spawn(move || {
            let (first, _s1) = listener.accept().expect("first accept should succeed");
            let (second, _s2) = listener.accept().expect("second accept should succeed");
            assert_eq!(first.peer_id, "peer-1");
            assert_eq!(second.peer_id, "peer-2");
            assert!(first.remote_addr.is_some());
        });

        let _c1 = connect(addr).expect("first client should connect");
        let _c2 = connect(addr).expect("second client should connect");
        server.join().expect("server thread should finish");
    }

    #[test]
    fn bind_failure_names_address() {
        let err = NodeListener::bind("not-an-address").err().expect("bind should fail");
        match err {
            NodeError::Bind { addr, .. } => assert_eq!(addr, "not-an-address"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
