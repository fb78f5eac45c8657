//! Peer sessions, message dispatch and the node launcher.
//!
//! A [`Node`] accepts TCP peers and runs one [`PeerSession`] per connection,
//! handing every decoded message to a [`Dispatcher`]. The [`Launcher`] wires
//! config, wallet, chain and client together and runs the client until the
//! [`ShutdownSignal`] fires.

pub mod config;
pub mod connector;
pub mod dispatch;
pub mod error;
pub mod launcher;
pub mod listener;
pub mod node;
pub mod session;
pub mod shutdown;
pub mod stats;

pub use config::{ChainConfig, NetworkConfig, NodeConfig, WalletConfig, DEFAULT_LISTEN_ADDR};
pub use connector::{connect, connect_with_config};
pub use dispatch::{Dispatcher, PeerContext, TracingDispatcher};
pub use error::{BoxError, DispatchError, NodeError, Result};
pub use launcher::{ChainStore, Client, ClientFactory, Launcher, WalletStore};
pub use listener::NodeListener;
pub use node::{Node, NodeFactory};
pub use session::{PeerSession, SessionEnd, SessionSummary};
pub use shutdown::ShutdownSignal;
pub use stats::{NodeStats, StatsSnapshot};
