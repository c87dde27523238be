use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod selftest;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept a link peer and print every packet it delivers.
    Listen(ListenArgs),
    /// Send a single packet and wait for its acknowledgement.
    Send(SendArgs),
    /// Exchange packets over an in-process link and report the results.
    Selftest(SelftestArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Selftest(args) => selftest::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Exit after receiving N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print packets addressed to this destination.
    #[arg(long)]
    pub dest: Option<u8>,
    /// Longest encoded body to accept (at most 16).
    #[arg(long, default_value_t = packlink_frame::MAX_ENCODED_LEN)]
    pub max_len: usize,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Destination node address.
    #[arg(long, short = 'd', default_value = "0")]
    pub dest: u8,
    /// Packet type code.
    #[arg(long = "type", short = 't')]
    pub packet_type: u8,
    /// Single payload byte; the rest of the payload is zero.
    #[arg(long, conflicts_with_all = ["payload", "u32"])]
    pub value: Option<u8>,
    /// Full payload as 8 hex digits, e.g. 10000000.
    #[arg(long, conflicts_with_all = ["value", "u32"])]
    pub payload: Option<String>,
    /// Payload as a little-endian 32-bit integer.
    #[arg(long, conflicts_with_all = ["value", "payload"])]
    pub u32: Option<u32>,
    /// Transmissions before giving up.
    #[arg(long, env = "PACKLINK_ATTEMPTS", default_value_t = packlink_frame::DEFAULT_MAX_ATTEMPTS)]
    pub attempts: u8,
    /// Acknowledgement timeout per attempt (e.g. 100ms, 2s).
    #[arg(long, env = "PACKLINK_ACK_TIMEOUT", default_value = "100ms")]
    pub ack_timeout: String,
    /// Wait for each acknowledgement without a timeout.
    #[arg(long, conflicts_with = "ack_timeout")]
    pub no_ack_timeout: bool,
    /// Call the idle hook while waiting for the acknowledgement.
    #[arg(long)]
    pub yield_on_ack: bool,
}

#[derive(Args, Debug)]
pub struct SelftestArgs {
    /// Number of packets to exchange.
    #[arg(long, default_value = "8")]
    pub count: usize,
    /// Bytes of line noise written ahead of each frame.
    #[arg(long, default_value = "0")]
    pub noise: usize,
    /// Corrupt the first transmission of every Nth packet.
    #[arg(long, value_name = "N")]
    pub corrupt_every: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance and link parameters.
    #[arg(long)]
    pub extended: bool,
}
