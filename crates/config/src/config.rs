//! Core configuration structures for the Safe lifecycle engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network configuration
    pub network: NetworkConfig,

    /// Chain configurations keyed by a human-readable name
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,

    /// Relay polling configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Request coalescing configuration
    #[serde(default)]
    pub coalesce: CoalesceConfig,

    /// Recovery module configuration
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

/// Network environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, testnet, local)
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            log_level: default_log_level(),
        }
    }
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    Local,
}

/// Endpoints and limits for one chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Numeric chain identifier
    pub chain_id: u64,

    /// RPC endpoint URL
    pub rpc_url: String,

    /// Transaction service base URL for this chain
    pub service_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum retry attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Relay task polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Seconds between relay task status polls
    #[serde(default = "default_relay_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Give up after this many polls without a terminal status
    #[serde(default = "default_relay_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_relay_poll_interval_secs(),
            max_attempts: default_relay_max_attempts(),
        }
    }
}

/// Request coalescing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoalesceConfig {
    /// Debounce window in milliseconds before a partial batch flushes
    #[serde(default = "default_flush_delay_ms")]
    pub flush_delay_ms: u64,

    /// A batch of this size flushes immediately
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

impl Default for CoalesceConfig {
    fn default() -> Self {
        Self {
            flush_delay_ms: default_flush_delay_ms(),
            max_batch: default_max_batch(),
        }
    }
}

/// Recovery module configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Seconds between queue reconstructions while items are pending
    #[serde(default = "default_recovery_refresh_secs")]
    pub refresh_interval_secs: u64,

    /// Automatically submit `skipExpired` when the queue head has expired
    #[serde(default)]
    pub auto_skip_expired: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_recovery_refresh_secs(),
            auto_skip_expired: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_relay_poll_interval_secs() -> u64 {
    15
}

fn default_relay_max_attempts() -> u32 {
    40
}

fn default_flush_delay_ms() -> u64 {
    50
}

fn default_max_batch() -> usize {
    20
}

fn default_recovery_refresh_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.network.log_level, "info");
        assert_eq!(config.relay.poll_interval_secs, 15);
        assert_eq!(config.relay.max_attempts, 40);
        assert_eq!(config.coalesce.max_batch, 20);
        assert!(!config.recovery.auto_skip_expired);
    }
}
