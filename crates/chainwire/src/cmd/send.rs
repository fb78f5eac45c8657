use chainwire_frame::Message;
use chainwire_node::connect_with_config;
use tracing::info;

use crate::cmd::{Context, SendArgs};
use crate::exit::{frame_error, node_error, CliResult, SUCCESS};

pub fn run(args: SendArgs, context: &Context) -> CliResult<i32> {
    let data = args.message.resolve_data()?;
    let message = Message::new(args.message.kind, data);

    let mut writer = connect_with_config(args.addr.as_str(), context.frame_config.clone())
        .map_err(|err| node_error("connect failed", err))?;
    writer
        .send_message(&message)
        .map_err(|err| frame_error("send failed", err))?;

    info!(
        addr = %args.addr,
        kind = message.kind().name(),
        len = message.data().len(),
        "message sent"
    );
    Ok(SUCCESS)
}
