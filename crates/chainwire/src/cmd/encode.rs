use std::fs::File;
use std::io::Write;

use chainwire_frame::{FrameWriter, Message};
use tracing::debug;

use crate::cmd::{Context, EncodeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};

pub fn run(args: EncodeArgs, context: &Context) -> CliResult<i32> {
    let data = args.message.resolve_data()?;
    let message = Message::new(args.message.kind, data);

    match &args.out {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
            write_frame(file, &message, context)?;
            debug!(path = %path.display(), kind = message.kind().name(), "frame written");
        }
        None => write_frame(std::io::stdout().lock(), &message, context)?,
    }

    Ok(SUCCESS)
}

fn write_frame<W: Write>(out: W, message: &Message, context: &Context) -> CliResult<()> {
    let mut writer = FrameWriter::with_config(out, context.frame_config.clone());
    writer
        .send_message(message)
        .map_err(|err| frame_error("encode failed", err))
}
