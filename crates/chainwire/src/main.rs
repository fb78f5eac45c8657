mod cmd;
mod exit;
mod logging;
mod output;

use chainwire_frame::FrameConfig;
use clap::Parser;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "chainwire", version, about = "Chainwire frame and node CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Reject frames whose payload exceeds this many bytes.
    #[arg(long, value_name = "BYTES", env = "CHAINWIRE_MAX_PAYLOAD", global = true)]
    max_payload: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = usage_exit_code(&err);
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    let context = Context {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        frame_config: FrameConfig {
            max_payload_size: cli.max_payload,
        },
    };

    match cmd::run(cli.command, &context) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

/// `--help` and `--version` succeed; every other parse failure is a usage error.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        exit::USAGE
    } else {
        exit::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "chainwire",
            "send",
            "127.0.0.1:7420",
            "--type",
            "1",
            "--data",
            "tx",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "chainwire",
            "encode",
            "--type",
            "0",
            "--file",
            "block.bin",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_out_of_range_type() {
        let err = Cli::try_parse_from(["chainwire", "encode", "--type", "256", "--data", "x"])
            .expect_err("type above 255 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parse_failures_exit_with_usage_code() {
        let err = Cli::try_parse_from(["chainwire", "bogus"]).expect_err("unknown subcommand");
        assert_eq!(usage_exit_code(&err), exit::USAGE);

        let err = Cli::try_parse_from(["chainwire", "encode", "--type", "256", "--data", "x"])
            .expect_err("type above 255 should fail");
        assert_eq!(usage_exit_code(&err), exit::USAGE);

        let err = Cli::try_parse_from(["chainwire", "--help"]).expect_err("help short-circuits");
        assert_eq!(usage_exit_code(&err), exit::SUCCESS);
    }

    #[test]
    fn global_max_payload_after_subcommand() {
        let cli = Cli::try_parse_from(["chainwire", "decode", "-", "--max-payload", "1024"])
            .expect("decode args should parse");
        assert_eq!(cli.max_payload, Some(1024));
        assert!(matches!(cli.command, Command::Decode(_)));
    }

    #[test]
    fn parses_listen_with_count() {
        let cli = Cli::try_parse_from(["chainwire", "listen", "127.0.0.1:0", "--count", "2"])
            .expect("listen args should parse");
        match cli.command {
            Command::Listen(args) => assert_eq!(args.count, Some(2)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
