//! Configuration management for the ticketing ledger.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use thiserror::Error;
use ticket_ledger_core::Principal;

/// Default contract owner when `LEDGER_CONTRACT_OWNER` is unset
pub const DEFAULT_CONTRACT_OWNER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

/// Default metadata base when `LEDGER_TOKEN_URI_BASE` is unset
pub const DEFAULT_TOKEN_URI_BASE: &str = "https://tickets.example/metadata/";

/// Invalid configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is empty
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// The journal broadcast buffer cannot hold anything
    #[error("LEDGER_JOURNAL_CAPACITY must be at least 1")]
    ZeroJournalCapacity,

    /// The journal would keep no events
    #[error("LEDGER_JOURNAL_RETENTION must be at least 1")]
    ZeroJournalRetention,

    /// Metrics host and port do not form a socket address
    #[error("Invalid metrics address {0}")]
    MetricsAddress(String),
}

/// Ledger configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Principal with root privilege over organizer authorization
    pub contract_owner: Principal,
    /// Prefix of every ticket's metadata URI
    pub token_uri_base: String,
    /// Committed events buffered for slow subscribers
    pub journal_capacity: usize,
    /// Most recent committed events kept readable through `journal_since`
    pub journal_retention: usize,
    /// Metrics settings
    pub metrics: MetricsConfig,
}

/// Prometheus exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether to start the exporter
    pub enabled: bool,
    /// Metrics server host (for Prometheus scraping)
    pub host: String,
    /// Metrics server port
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract_owner: Principal::from(DEFAULT_CONTRACT_OWNER),
            token_uri_base: DEFAULT_TOKEN_URI_BASE.to_string(),
            journal_capacity: 256,
            journal_retention: 10_000,
            metrics: MetricsConfig {
                enabled: false,
                host: "0.0.0.0".to_string(),
                port: 9090,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults; call
    /// [`validate`](Self::validate) before using the result.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            contract_owner: env::var("LEDGER_CONTRACT_OWNER")
                .map_or(defaults.contract_owner, Principal::new),
            token_uri_base: env::var("LEDGER_TOKEN_URI_BASE")
                .unwrap_or(defaults.token_uri_base),
            journal_capacity: env::var("LEDGER_JOURNAL_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.journal_capacity),
            journal_retention: env::var("LEDGER_JOURNAL_RETENTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.journal_retention),
            metrics: MetricsConfig {
                enabled: env::var("METRICS_ENABLED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.metrics.enabled),
                host: env::var("METRICS_HOST").unwrap_or(defaults.metrics.host),
                port: env::var("METRICS_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.metrics.port),
            },
        }
    }

    /// Check the configuration can run a ledger
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_owner.as_str().trim().is_empty() {
            return Err(ConfigError::Empty("LEDGER_CONTRACT_OWNER"));
        }
        if self.token_uri_base.trim().is_empty() {
            return Err(ConfigError::Empty("LEDGER_TOKEN_URI_BASE"));
        }
        if self.journal_capacity == 0 {
            return Err(ConfigError::ZeroJournalCapacity);
        }
        if self.journal_retention == 0 {
            return Err(ConfigError::ZeroJournalRetention);
        }
        if self.metrics.enabled {
            self.metrics_addr()?;
        }
        Ok(())
    }

    /// Socket address the metrics exporter binds to
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MetricsAddress`] if host and port do not parse.
    pub fn metrics_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.metrics.host, self.metrics.port);
        addr.parse().map_err(|_| ConfigError::MetricsAddress(addr))
    }
}
