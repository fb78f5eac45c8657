use std::sync::atomic::{AtomicU64, Ordering};

use chainwire_frame::Message;
use chainwire_node::{
    DispatchError, Dispatcher, NetworkConfig, Node, NodeConfig, PeerContext, ShutdownSignal,
};
use tracing::info;

use crate::cmd::{Context, ListenArgs};
use crate::exit::{node_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, context: &Context) -> CliResult<i32> {
    let network = network_config(&args, context)?;

    let shutdown = ShutdownSignal::new();
    install_ctrlc_handler(shutdown.clone())?;

    let printer = PrintingDispatcher {
        format: context.format,
        limit: args.count,
        printed: AtomicU64::new(0),
        shutdown: shutdown.clone(),
    };
    let node = Node::bind(&network, printer).map_err(|err| node_error("bind failed", err))?;
    let stats = node.stats();

    node.run(shutdown)
        .map_err(|err| node_error("node failed", err))?;

    let totals = stats.snapshot();
    info!(
        messages = totals.messages(),
        checksum_mismatches = totals.checksum_mismatches,
        malformed_payloads = totals.malformed_payloads,
        incomplete_frames = totals.incomplete_frames,
        "listen finished"
    );
    Ok(SUCCESS)
}

fn network_config(args: &ListenArgs, context: &Context) -> CliResult<NetworkConfig> {
    let mut network = match &args.config {
        Some(path) => {
            NodeConfig::load(path)
                .map_err(|err| node_error("config failed", err))?
                .network
        }
        None => NetworkConfig::default(),
    };
    if let Some(addr) = &args.addr {
        network.listen_addr = addr.clone();
    }
    if context.frame_config.max_payload_size.is_some() {
        network.max_payload_size = context.frame_config.max_payload_size;
    }
    Ok(network)
}

/// Prints every message and fires `shutdown` once `limit` messages were printed.
struct PrintingDispatcher {
    format: OutputFormat,
    limit: Option<u64>,
    printed: AtomicU64,
    shutdown: ShutdownSignal,
}

impl Dispatcher for PrintingDispatcher {
    fn dispatch(&self, peer: &PeerContext, message: Message) -> Result<(), DispatchError> {
        if self.shutdown.is_triggered() {
            return Ok(());
        }
        print_message(&message, Some(&peer.peer_id), self.format);

        let printed = self.printed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.limit.is_some_and(|limit| printed >= limit) {
            self.shutdown.trigger();
        }
        Ok(())
    }
}

fn install_ctrlc_handler(shutdown: ShutdownSignal) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.trigger()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use chainwire_frame::{FrameConfig, MessageType};

    use super::*;

    #[test]
    fn count_limit_fires_shutdown() {
        let shutdown = ShutdownSignal::new();
        let printer = PrintingDispatcher {
            format: OutputFormat::Pretty,
            limit: Some(2),
            printed: AtomicU64::new(0),
            shutdown: shutdown.clone(),
        };
        let peer = PeerContext::new("peer-1", None);

        printer
            .dispatch(&peer, Message::new(MessageType::Block, b"a".to_vec()))
            .unwrap();
        assert!(!shutdown.is_triggered());
        printer
            .dispatch(&peer, Message::new(MessageType::Block, b"b".to_vec()))
            .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let args = ListenArgs {
            addr: Some("127.0.0.1:9999".to_string()),
            config: None,
            count: None,
        };
        let context = Context {
            format: OutputFormat::Json,
            frame_config: FrameConfig::with_max_payload(512),
        };

        let network = network_config(&args, &context).unwrap();
        assert_eq!(network.listen_addr, "127.0.0.1:9999");
        assert_eq!(network.max_payload_size, Some(512));
    }
}
