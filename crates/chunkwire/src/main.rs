mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "chunkwire",
    version,
    about = "Packet framing and reassembly for chunked byte links"
)]
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

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use chunkwire_frame::PacketType;

    use super::*;

    #[test]
    fn parses_encode_with_type_name() {
        let cli = Cli::try_parse_from([
            "chunkwire",
            "encode",
            "--type",
            "Command",
            "--seq",
            "7",
            "--data",
            "INIT",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.packet_type, PacketType::Command);
                assert_eq!(args.seq, 7);
                assert_eq!(args.payload.data.as_deref(), Some("INIT"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_type_ordinal() {
        let cli = Cli::try_parse_from(["chunkwire", "encode", "-t", "4"])
            .expect("ordinal type should parse");
        assert!(matches!(
            cli.command,
            Command::Encode(ref args) if args.packet_type == PacketType::Error
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        let err = Cli::try_parse_from(["chunkwire", "encode", "--type", "telemetry"])
            .expect_err("unknown type should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[cfg(unix)]
    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "chunkwire",
            "send",
            "/tmp/test.sock",
            "--json",
            "{\"x\":1}",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[cfg(unix)]
    #[test]
    fn parses_listen_type_filter() {
        let cli = Cli::try_parse_from([
            "chunkwire",
            "listen",
            "/tmp/test.sock",
            "--types",
            "data,error",
            "--count",
            "2",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(
                    args.types,
                    Some(vec![PacketType::Data, PacketType::Error])
                );
                assert_eq!(args.count, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_hex_with_file() {
        let err = Cli::try_parse_from([
            "chunkwire",
            "decode",
            "--hex",
            "AABB",
            "--file",
            "capture.bin",
        ])
        .expect_err("conflicting inputs should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
