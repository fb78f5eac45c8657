use std::fs::File;
use std::io::{BufReader, Read};

use chainwire_frame::FrameReader;
use tracing::debug;

use crate::cmd::{Context, DecodeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::print_message;

pub fn run(args: DecodeArgs, context: &Context) -> CliResult<i32> {
    if args.input == "-" {
        return decode_stream(std::io::stdin().lock(), context);
    }

    let file = File::open(&args.input)
        .map_err(|err| io_error(&format!("failed opening {}", args.input), err))?;
    decode_stream(BufReader::new(file), context)
}

/// Print every message until the stream ends on a frame boundary.
fn decode_stream<R: Read>(input: R, context: &Context) -> CliResult<i32> {
    let mut reader = FrameReader::with_config(input, context.frame_config.clone());
    let mut decoded = 0u64;

    loop {
        match reader.read_message() {
            Ok(message) => {
                print_message(&message, None, context.format);
                decoded += 1;
            }
            Err(err) if err.is_clean_close() => break,
            Err(err) => {
                return Err(frame_error(&format!("frame {} invalid", decoded + 1), err));
            }
        }
    }

    debug!(frames = decoded, "stream decoded");
    Ok(SUCCESS)
}
