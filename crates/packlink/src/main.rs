mod cmd;
mod exit;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use crate::cmd::Command;
use crate::exit::{CliResult, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

/// Exchange acknowledged packets over a router/dispenser serial link.
#[derive(Parser, Debug)]
#[command(name = "packlink", version)]
struct Cli {
    /// Stdout format; defaults to table on a terminal and json otherwise.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Stderr log encoding.
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Level for CLI messages, and for link events unless overridden.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Level for resync, retry and acknowledgement events from the link.
    #[arg(long, value_name = "LEVEL", global = true)]
    link_log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn run(self) -> CliResult<i32> {
        init_logging(self.log_format, self.log_level, self.link_log_level);
        let format = self.format.unwrap_or_else(OutputFormat::default_for_stdout);
        cmd::run(self.command, format)
    }
}

fn main() -> ExitCode {
    let code = Cli::parse().run().unwrap_or_else(|err| {
        eprintln!("error: {err}");
        err.code
    });
    ExitCode::from(u8::try_from(code).unwrap_or(INTERNAL as u8))
}
