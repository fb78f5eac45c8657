//! TCP node serving one [`PeerSession`] thread per connection.

use std::io::{self, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chainwire_frame::FrameConfig;
use tracing::{debug, info, warn};

use crate::config::{NetworkConfig, NodeConfig};
use crate::dispatch::{Dispatcher, PeerContext};
use crate::error::{BoxError, NodeError, Result};
use crate::launcher::{Client, ClientFactory};
use crate::listener::NodeListener;
use crate::session::{PeerSession, SessionSummary};
use crate::shutdown::ShutdownSignal;
use crate::stats::NodeStats;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Readies an accepted stream for its session and returns the handle used to close it.
type StreamSetup = fn(&TcpStream) -> io::Result<TcpStream>;

fn prepare_stream(stream: &TcpStream) -> io::Result<TcpStream> {
    stream.set_nonblocking(false)?;
    stream.try_clone()
}

struct LiveSession {
    stream: TcpStream,
    handle: JoinHandle<SessionSummary>,
}

/// Accepts peers and feeds their messages to a shared dispatcher.
pub struct Node<D> {
    listener: NodeListener,
    dispatcher: Arc<D>,
    frame_config: FrameConfig,
    stats: Arc<NodeStats>,
    setup: StreamSetup,
}

impl<D: Dispatcher + 'static> Node<D> {
    /// Bind the listen address from `config`.
    pub fn bind(config: &NetworkConfig, dispatcher: D) -> Result<Self> {
        let listener = NodeListener::bind(&config.listen_addr)?;
        info!(addr = %config.listen_addr, "node listening");
        Ok(Self {
            listener,
            dispatcher: Arc::new(dispatcher),
            frame_config: config.frame_config(),
            stats: Arc::new(NodeStats::new()),
            setup: prepare_stream,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared counters, live while the node runs.
    pub fn stats(&self) -> Arc<NodeStats> {
        Arc::clone(&self.stats)
    }

    /// Accept peers until `shutdown` fires.
    ///
    /// On shutdown every live peer stream is closed, which ends its session
    /// with a clean close or an incomplete frame, and all session threads are
    /// joined before returning.
    pub fn run(self, shutdown: ShutdownSignal) -> Result<()> {
        self.listener.set_nonblocking(true)?;
        let mut sessions: Vec<LiveSession> = Vec::new();

        while !shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((context, stream)) => {
                    self.stats.record_connection();
                    let peer_id = context.peer_id.clone();
                    match self.start_session(context, stream) {
                        Ok(session) => sessions.push(session),
                        Err(err) => {
                            self.stats.record_rejected_connection();
                            warn!(
                                peer = %peer_id,
                                error = %err,
                                "peer setup failed, connection dropped"
                            );
                        }
                    }
                }
                Err(NodeError::Io(err)) if err.kind() == ErrorKind::WouldBlock => {
                    shutdown.wait_timeout(ACCEPT_POLL_INTERVAL);
                }
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    shutdown.wait_timeout(ACCEPT_POLL_INTERVAL);
                }
            }
            sessions.retain(|session| !session.handle.is_finished());
        }

        info!(peers = sessions.len(), "node shutting down");
        for session in &sessions {
            let _ = session.stream.shutdown(Shutdown::Both);
        }
        for session in sessions {
            match session.handle.join() {
                Ok(summary) => debug!(
                    peer = %summary.peer_id,
                    messages = summary.messages,
                    "session joined"
                ),
                Err(_) => warn!("session thread panicked"),
            }
        }

        let totals = self.stats.snapshot();
        info!(
            connections = totals.connections,
            rejected_connections = totals.rejected_connections,
            messages = totals.messages(),
            checksum_mismatches = totals.checksum_mismatches,
            "node stopped"
        );
        Ok(())
    }

    /// Spawn the session thread for one accepted peer.
    ///
    /// On error the stream is dropped, which closes the connection.
    fn start_session(&self, context: PeerContext, stream: TcpStream) -> io::Result<LiveSession> {
        let closer = (self.setup)(&stream)?;
        debug!(peer = %context.peer_id, remote = ?context.remote_addr, "peer accepted");

        let name = format!("chainwire-{}", context.peer_id);
        let session = PeerSession::new(
            context,
            stream,
            self.frame_config.clone(),
            Arc::clone(&self.stats),
        );
        let dispatcher = Arc::clone(&self.dispatcher);
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || session.run(dispatcher.as_ref()))?;
        Ok(LiveSession {
            stream: closer,
            handle,
        })
    }
}

impl<D: Dispatcher + 'static> Client for Node<D> {
    fn run(self, shutdown: ShutdownSignal) -> Result<()> {
        Node::run(self, shutdown)
    }
}

/// Builds a [`Node`] from the launcher's config, chain and wallet.
///
/// `F` turns the chain and wallet into the node's dispatcher.
pub struct NodeFactory<F> {
    make_dispatcher: F,
}

impl<F> NodeFactory<F> {
    pub fn new(make_dispatcher: F) -> Self {
        Self { make_dispatcher }
    }
}

impl<C, W, D, F> ClientFactory<C, W> for NodeFactory<F>
where
    D: Dispatcher + 'static,
    F: Fn(&NodeConfig, C, W) -> D,
{
    type Client = Node<D>;

    fn create(
        &self,
        config: &NodeConfig,
        chain: C,
        wallet: W,
    ) -> std::result::Result<Node<D>, BoxError> {
        let dispatcher = (self.make_dispatcher)(config, chain, wallet);
        Ok(Node::bind(&config.network, dispatcher)?)
    }
}
