//! Node configuration file.
//!
//! A JSON document, every section optional:
//!
//! ```json
//! {
//!   "wallet":  { "pub_key_path": "wallet/pub.key", "priv_key_path": "wallet/priv.key" },
//!   "chain":   { "database_path": "data/chain.db", "log_path": "data/chain.log" },
//!   "network": { "listen_addr": "127.0.0.1:7420", "max_payload_size": null }
//! }
//! ```
//!
//! The older `WalletCfg`/`ChainCfg` key spelling is accepted as well.

use std::path::{Path, PathBuf};

use chainwire_frame::FrameConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NodeError, Result};

/// Default peer listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7420";

/// Top-level node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    #[serde(alias = "WalletCfg")]
    pub wallet: WalletConfig,
    #[serde(alias = "ChainCfg")]
    pub chain: ChainConfig,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    #[serde(alias = "PubKeyPath")]
    pub pub_key_path: PathBuf,
    #[serde(alias = "PriKeyPath")]
    pub priv_key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    #[serde(alias = "ChainDataBasePath")]
    pub database_path: PathBuf,
    #[serde(alias = "LogPath")]
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address peers connect to.
    pub listen_addr: String,
    /// Reject frames whose length prefix exceeds this. `None` = unbounded.
    pub max_payload_size: Option<u64>,
}

impl NodeConfig {
    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| NodeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_slice(&raw).map_err(|source| NodeError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?path, listen_addr = %config.network.listen_addr, "loaded node config");
        Ok(config)
    }

    /// Frame codec settings derived from the network section.
    pub fn frame_config(&self) -> FrameConfig {
        self.network.frame_config()
    }
}

impl NetworkConfig {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            pub_key_path: PathBuf::from("wallet/pub.key"),
            priv_key_path: PathBuf::from("wallet/priv.key"),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/chain.db"),
            log_path: PathBuf::from("data/chain.log"),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_payload_size: None,
        }
    }
}
