//! Node start-up sequence.
//!
//! Load config, open (or create) the wallet, load the chain, build the
//! client, then run it until the exit signal fires. Wallet, chain and client
//! are supplied through the traits below.

use std::path::Path;
use std::thread;

use tracing::{info, warn};

use crate::config::{ChainConfig, NodeConfig, WalletConfig};
use crate::error::{BoxError, NodeError, Result};
use crate::shutdown::ShutdownSignal;

/// Loads, creates and persists the node's key material.
pub trait WalletStore {
    type Wallet;

    fn load(&self, config: &WalletConfig) -> std::result::Result<Self::Wallet, BoxError>;

    fn create(&self) -> std::result::Result<Self::Wallet, BoxError>;

    fn save(
        &self,
        wallet: &Self::Wallet,
        config: &WalletConfig,
    ) -> std::result::Result<(), BoxError>;
}

/// Opens the local chain database.
pub trait ChainStore {
    type Chain;

    fn load(&self, config: &ChainConfig) -> std::result::Result<Self::Chain, BoxError>;
}

/// The long-running part of a node.
pub trait Client: Send + 'static {
    /// Run until `shutdown` fires, then finish in-flight work and return.
    fn run(self, shutdown: ShutdownSignal) -> Result<()>;
}

/// Builds a [`Client`] from the loaded chain and wallet.
pub trait ClientFactory<C, W> {
    type Client: Client;

    fn create(
        &self,
        config: &NodeConfig,
        chain: C,
        wallet: W,
    ) -> std::result::Result<Self::Client, BoxError>;
}

/// Fires the signal when the client thread exits, including by panic.
struct TriggerOnDrop(ShutdownSignal);

impl Drop for TriggerOnDrop {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

/// Runs the start-up sequence over a set of collaborators.
pub struct Launcher<WS, CS, CF> {
    wallets: WS,
    chains: CS,
    clients: CF,
}

impl<WS, CS, CF> Launcher<WS, CS, CF>
where
    WS: WalletStore,
    CS: ChainStore,
    CF: ClientFactory<CS::Chain, WS::Wallet>,
{
    pub fn new(wallets: WS, chains: CS, clients: CF) -> Self {
        Self {
            wallets,
            chains,
            clients,
        }
    }

    /// Load the config at `config_path` and launch.
    pub fn launch(&self, config_path: impl AsRef<Path>, shutdown: ShutdownSignal) -> Result<()> {
        let config = NodeConfig::load(config_path)?;
        self.launch_with_config(&config, shutdown)
    }

    /// Launch with an already loaded config. Blocks until the client returns.
    pub fn launch_with_config(&self, config: &NodeConfig, shutdown: ShutdownSignal) -> Result<()> {
        let wallet = self.open_wallet(&config.wallet)?;
        let chain = self.chains.load(&config.chain).map_err(NodeError::Chain)?;
        info!(database = ?config.chain.database_path, "chain loaded");

        let client = self
            .clients
            .create(config, chain, wallet)
            .map_err(NodeError::Client)?;

        let handle = {
            let shutdown = shutdown.clone();
            thread::Builder::new()
                .name("chainwire-client".to_string())
                .spawn(move || {
                    let _guard = TriggerOnDrop(shutdown.clone());
                    client.run(shutdown)
                })?
        };
        info!("client started");

        shutdown.wait();
        info!("exit signal received, waiting for client");

        let result = handle.join().map_err(|_| NodeError::ClientPanicked)?;
        match &result {
            Ok(()) => info!("client stopped"),
            Err(err) => warn!(error = %err, "client stopped with error"),
        }
        result
    }

    fn open_wallet(&self, config: &WalletConfig) -> Result<WS::Wallet> {
        match self.wallets.load(config) {
            Ok(wallet) => {
                info!(pub_key = ?config.pub_key_path, "wallet loaded");
                Ok(wallet)
            }
            Err(err) => {
                warn!(pub_key = ?config.pub_key_path, error = %err, "wallet not loaded, creating a new one");
                let wallet = self.wallets.create().map_err(NodeError::Wallet)?;
                self.wallets
                    .save(&wallet, config)
                    .map_err(NodeError::Wallet)?;
                info!(pub_key = ?config.pub_key_path, "new wallet saved");
                Ok(wallet)
            }
        }
    }
}
