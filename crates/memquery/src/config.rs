//! Environment-driven server configuration.
//!
//! - `MEMQUERY_TIMEOUT_SECS`: default per-query time limit in seconds
//!   (unset or `0` means no limit)
//! - `MEMQUERY_LOG`: tracing filter directive, takes precedence over `RUST_LOG`

use anyhow::{Context, Result};
use std::time::Duration;

pub const TIMEOUT_ENV: &str = "MEMQUERY_TIMEOUT_SECS";
pub const LOG_ENV: &str = "MEMQUERY_LOG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub default_timeout: Option<Duration>,
    pub log_filter: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a whole number of seconds, got '{}'", TIMEOUT_ENV, raw))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            _ => None,
        };

        let log_filter = lookup(LOG_ENV).filter(|s| !s.trim().is_empty());

        Ok(ServerConfig {
            default_timeout,
            log_filter,
        })
    }

    /// Per-request override wins; `Some(0)` disables the limit for that request.
    pub fn effective_timeout(&self, requested_secs: Option<u64>) -> Option<Duration> {
        match requested_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => self.default_timeout,
        }
    }
}
