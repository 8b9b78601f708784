//! # Runtime Configuration Module
//!
//! Environment-driven settings read once at startup.
//!
//! ## Environment Variables
//!
//! ### `APIREG_SPEC_DIR`
//!
//! Directory holding named spec documents (`<name>.json`, `<name>.yaml` or
//! `<name>.yml`). Default: `apispec`.
//!
//! ### `APIREG_VALIDATE_COMMANDS`
//!
//! Whether command payloads are checked against their schemas. Accepts
//! `true`/`false`, `1`/`0`, `on`/`off`, `yes`/`no`. Default: `true`.
//!
//! Unparseable values fall back to the defaults.
//!
//! ```rust
//! use apireg::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("specs from {}", config.spec_dir.display());
//! ```

use std::env;
use std::path::PathBuf;

pub const DEFAULT_SPEC_DIR: &str = "apispec";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub spec_dir: PathBuf,
    pub validate_commands: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            spec_dir: PathBuf::from(DEFAULT_SPEC_DIR),
            validate_commands: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        RuntimeConfig {
            spec_dir: lookup("APIREG_SPEC_DIR")
                .filter(|s| !s.trim().is_empty())
                .map_or(defaults.spec_dir, PathBuf::from),
            validate_commands: lookup("APIREG_VALIDATE_COMMANDS")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.validate_commands),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}
