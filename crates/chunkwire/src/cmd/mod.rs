use std::fs;
use std::path::PathBuf;

use chunkwire_frame::{PacketType, DEFAULT_MAX_BUFFER};
use clap::{Args, Subcommand};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
#[cfg(unix)]
pub mod echo;
pub mod encode;
#[cfg(unix)]
pub mod listen;
#[cfg(unix)]
pub mod send;
#[cfg(unix)]
mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one packet and print its frame.
    Encode(EncodeArgs),
    /// Reassemble packets from a captured byte stream.
    Decode(DecodeArgs),
    #[cfg(unix)]
    /// Send a single packet over a Unix socket.
    Send(SendArgs),
    #[cfg(unix)]
    /// Listen on a Unix socket and print received packets.
    Listen(ListenArgs),
    #[cfg(unix)]
    /// Answer every received packet with a response carrying the same payload.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        #[cfg(unix)]
        Command::Send(args) => send::run(args, format),
        #[cfg(unix)]
        Command::Listen(args) => listen::run(args, format),
        #[cfg(unix)]
        Command::Echo(args) => echo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Payload source shared by `encode` and `send`.
#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// JSON payload (validated, sent as given).
    #[arg(long, conflicts_with_all = ["data", "file", "hex"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file", "hex"])]
    pub data: Option<String>,
    /// Payload given as hex digits.
    #[arg(long, conflicts_with_all = ["json", "data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data", "hex"])]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    /// Resolve the payload bytes. No source means an empty payload.
    pub fn resolve(&self) -> CliResult<Vec<u8>> {
        if let Some(json) = &self.json {
            serde_json::from_str::<serde_json::Value>(json)
                .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
            return Ok(json.as_bytes().to_vec());
        }
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(digits) = &self.hex {
            return parse_hex(digits);
        }
        if let Some(path) = &self.file {
            return fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        Ok(Vec::new())
    }
}

/// Parse hex digits, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let digits: String = trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Packet type (name or wire code).
    #[arg(long = "type", short = 't', default_value = "command")]
    pub packet_type: PacketType,
    /// Sequence number to stamp on the packet.
    #[arg(long, default_value_t = 0)]
    pub seq: u16,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input as hex digits. Default: read raw bytes from stdin.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read raw input bytes from file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Feed the input in chunks of N bytes, as a radio link would.
    #[arg(long, value_name = "N")]
    pub chunk: Option<usize>,
    /// Reassembly ceiling in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_BUFFER)]
    pub max_buffer: usize,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Packet type (name or wire code).
    #[arg(long = "type", short = 't', default_value = "command")]
    pub packet_type: PacketType,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Wait for one inbound packet and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Only print these packet types (comma-separated names or codes).
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<PacketType>>,
    /// Exit after printing N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Only answer these packet types (comma-separated names or codes).
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<PacketType>>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn type_allowed(filter: Option<&[PacketType]>, packet_type: PacketType) -> bool {
    filter.is_none_or(|types| types.contains(&packet_type))
}
