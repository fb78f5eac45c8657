//! Launch a node from an in-memory wallet and chain, send it one message over
//! TCP, then shut it down.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chainwire::frame::{Message, MessageType};
use chainwire::node::{
    connect, BoxError, ChainConfig, ChainStore, DispatchError, Launcher, NetworkConfig,
    NodeConfig, NodeFactory, PeerContext, ShutdownSignal, WalletConfig, WalletStore,
};

struct EphemeralWallets {
    saved: Mutex<Option<String>>,
}

impl WalletStore for EphemeralWallets {
    type Wallet = String;

    fn load(&self, config: &WalletConfig) -> Result<String, BoxError> {
        Err(format!("no key at {}", config.pub_key_path.display()).into())
    }

    fn create(&self) -> Result<String, BoxError> {
        Ok("demo-wallet".to_string())
    }

    fn save(&self, wallet: &String, _config: &WalletConfig) -> Result<(), BoxError> {
        *self.saved.lock().map_err(|_| "wallet lock poisoned")? = Some(wallet.clone());
        Ok(())
    }
}

struct GenesisOnly;

impl ChainStore for GenesisOnly {
    type Chain = u64;

    fn load(&self, _config: &ChainConfig) -> Result<u64, BoxError> {
        Ok(0)
    }
}

fn main() {
    let config = NodeConfig {
        network: NetworkConfig {
            listen_addr: "127.0.0.1:7421".to_string(),
            max_payload_size: Some(64 * 1024),
        },
        ..NodeConfig::default()
    };

    let factory = NodeFactory::new(|_config: &NodeConfig, height: u64, wallet: String| {
        move |peer: &PeerContext, message: Message| -> Result<(), DispatchError> {
            println!(
                "[{wallet} @ height {height}] {} from {}: {} bytes",
                message.kind().name(),
                peer.peer_id,
                message.data().len()
            );
            Ok(())
        }
    });
    let launcher = Launcher::new(
        EphemeralWallets {
            saved: Mutex::new(None),
        },
        GenesisOnly,
        factory,
    );

    let shutdown = ShutdownSignal::new();
    let sender = {
        let shutdown = shutdown.clone();
        let addr = config.network.listen_addr.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            match connect(addr.as_str()) {
                Ok(mut writer) => {
                    let block = Message::new(MessageType::Block, b"genesis+1".to_vec());
                    if let Err(err) = writer.send_message(&block) {
                        eprintln!("send failed: {err}");
                    }
                }
                Err(err) => eprintln!("connect failed: {err}"),
            }
            thread::sleep(Duration::from_millis(200));
            shutdown.trigger();
        })
    };

    if let Err(err) = launcher.launch_with_config(&config, shutdown) {
        eprintln!("node failed: {err}");
    }
    let _ = sender.join();
}
