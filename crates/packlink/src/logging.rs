//! Stderr diagnostics for the CLI.
//!
//! Protocol crates log resynchronization, retries and rejected frames under
//! their own targets. `--link-log-level` tunes those targets independently of
//! the CLI's own messages, and `PACKLINK_LOG` (an `EnvFilter` directive
//! string) overrides both.

use clap::ValueEnum;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Environment variable holding filter directives, e.g. `packlink_peer=trace`.
pub const LOG_ENV: &str = "PACKLINK_LOG";

/// Library targets that carry link-level events.
const LINK_TARGETS: [&str; 3] = ["packlink_transport", "packlink_frame", "packlink_peer"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Directive string for a CLI level plus an optional link-level override.
pub fn filter_directives(level: LogLevel, link_level: Option<LogLevel>) -> String {
    let mut directives = level.directive().to_string();
    if let Some(link) = link_level {
        for target in LINK_TARGETS {
            directives.push(',');
            directives.push_str(target);
            directives.push('=');
            directives.push_str(link.directive());
        }
    }
    directives
}

pub fn init_logging(format: LogFormat, level: LogLevel, link_level: Option<LogLevel>) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .parse_lossy(filter_directives(level, link_level))
    });

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_alone_is_a_single_directive() {
        assert_eq!(filter_directives(LogLevel::Warn, None), "warn");
    }

    #[test]
    fn link_level_targets_protocol_crates() {
        let directives = filter_directives(LogLevel::Error, Some(LogLevel::Debug));
        assert_eq!(
            directives,
            "error,packlink_transport=debug,packlink_frame=debug,packlink_peer=debug"
        );
        assert!(directives.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn link_logging_can_be_silenced() {
        let directives = filter_directives(LogLevel::Info, Some(LogLevel::Off));
        assert!(directives.ends_with("packlink_peer=off"));
    }
}
