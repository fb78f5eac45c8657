use std::fs;
use std::path::PathBuf;

use chainwire_frame::FrameConfig;
use clap::{Args, Subcommand};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub frame_config: FrameConfig,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one message as a frame.
    Encode(EncodeArgs),
    /// Decode and print every frame in a stream.
    Decode(DecodeArgs),
    /// Send one message to a node.
    Send(SendArgs),
    /// Run a node and print received messages.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, context: &Context) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, context),
        Command::Decode(args) => decode::run(args, context),
        Command::Send(args) => send::run(args, context),
        Command::Listen(args) => listen::run(args, context),
        Command::Version(args) => version::run(args),
    }
}

/// Message body given on the command line.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Message type discriminant (0 block, 1 transaction, 2 consensus).
    #[arg(long = "type", short = 't', value_name = "N")]
    pub kind: u8,
    /// Message data as a UTF-8 string.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read message data from a file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
}

impl MessageArgs {
    pub fn resolve_data(&self) -> CliResult<Vec<u8>> {
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(path) = &self.file {
            return fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        Ok(Vec::new())
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub message: MessageArgs,
    /// Write the frame here instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame stream to read, `-` for stdin.
    #[arg(default_value = "-")]
    pub input: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Node address, e.g. 127.0.0.1:7420.
    pub addr: String,
    #[command(flatten)]
    pub message: MessageArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to listen on. Overrides the config file.
    pub addr: Option<String>,
    /// Node config file; only the network section is used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
