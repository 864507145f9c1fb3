//! Logging Setup
//!
//! Logs always go to stderr: stdout carries the JSON documents consumed by
//! Ansible and other tools.

use crate::error::{Error, Result};
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map a `--log-level` value onto a tracing level, `info` when unknown
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let mut filter = EnvFilter::from_default_env().add_directive(parse_level(level).into());
    for directive in ["hyper=warn", "reqwest=info", "rustls=warn"] {
        let directive = directive
            .parse::<Directive>()
            .map_err(|e| Error::Configuration(format!("bad log directive {}: {}", directive, e)))?;
        filter = filter.add_directive(directive);
    }

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| Error::Internal(format!("failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("loud"), Level::INFO);
    }
}
