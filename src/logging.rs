//! Structured logging setup.
//!
//! The library only emits `tracing` events; binaries call [`init_logging`] once at
//! startup to install a subscriber.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `APIREG_LOG_LEVEL` | `info` | trace/debug/info/warn/error |
//! | `APIREG_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `APIREG_LOG_TARGETS` | unset | extra comma-separated `EnvFilter` directives |
//!
//! `RUST_LOG`, when set, takes precedence over `APIREG_LOG_LEVEL`.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Extra directives such as `apireg::router=debug`
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            format: LogFormat::Json,
            target_filter: None,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("APIREG_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("APIREG_LOG_FORMAT")
                .map_or(defaults.format, |f| LogFormat::parse(&f)),
            target_filter: lookup("APIREG_LOG_TARGETS").filter(|s| !s.trim().is_empty()),
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        for directive in self
            .target_filter
            .iter()
            .flat_map(|t| t.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("Warning: invalid log filter directive {directive}: {e}"),
            }
        }
        filter
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    tracing::debug!(
        level = %config.log_level,
        format = ?config.format,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> LogConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        LogConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]);
        assert_eq!(c.log_level, "info");
        assert_eq!(c.format, LogFormat::Json);
        assert!(c.target_filter.is_none());
    }

    #[test]
    fn reads_overrides() {
        let c = config(&[
            ("APIREG_LOG_LEVEL", "debug"),
            ("APIREG_LOG_FORMAT", "Pretty"),
            ("APIREG_LOG_TARGETS", "apireg::router=trace"),
        ]);
        assert_eq!(c.level(), Level::DEBUG);
        assert_eq!(c.format, LogFormat::Pretty);
        assert_eq!(c.target_filter.as_deref(), Some("apireg::router=trace"));
    }

    #[test]
    fn unknown_values_fall_back() {
        let c = config(&[("APIREG_LOG_LEVEL", "loud"), ("APIREG_LOG_FORMAT", "xml")]);
        assert_eq!(c.level(), Level::INFO);
        assert_eq!(c.format, LogFormat::Json);
    }
}
