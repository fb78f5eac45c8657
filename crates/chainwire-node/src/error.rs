use std::path::PathBuf;

/// Error type returned by external collaborators (wallet, chain, client, dispatcher).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while launching or running a node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] chainwire_frame::FrameError),

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not a valid node config.
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Wallet material could not be loaded or saved.
    #[error("wallet error: {0}")]
    Wallet(#[source] BoxError),

    /// The chain could not be loaded.
    #[error("chain error: {0}")]
    Chain(#[source] BoxError),

    /// The client could not be created or failed while running.
    #[error("client error: {0}")]
    Client(#[source] BoxError),

    /// Failed to bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Socket-level I/O error.
    #[error("node I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The client thread panicked instead of returning.
    #[error("client thread panicked")]
    ClientPanicked,
}

/// Errors reported by a [`Dispatcher`](crate::dispatch::Dispatcher).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler is registered for this discriminant.
    #[error("no handler for message type {0}")]
    Unhandled(u8),

    /// The handler rejected the message.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),
}

pub type Result<T> = std::result::Result<T, NodeError>;
