//! Configuration validation

use crate::{AppConfig, ChainConfig, ConfigError, Result};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    for (chain_name, chain_config) in &config.chains {
        if let Err(e) = validate_chain_config(chain_config) {
            errors.push(ValidationError::new(
                format!("chains.{chain_name}"),
                e.to_string(),
            ));
        }
    }

    if config.relay.poll_interval_secs == 0 {
        errors.push(ValidationError::new(
            "relay.poll_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.relay.max_attempts == 0 {
        errors.push(ValidationError::new(
            "relay.max_attempts",
            "must be greater than 0",
        ));
    }

    if config.coalesce.max_batch == 0 {
        errors.push(ValidationError::new(
            "coalesce.max_batch",
            "must be greater than 0",
        ));
    }

    if config.recovery.refresh_interval_secs == 0 {
        errors.push(ValidationError::new(
            "recovery.refresh_interval_secs",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let combined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::ValidationError(combined))
    }
}

fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        other => Err(ValidationError::new(
            "network.log_level",
            format!("unknown log level '{other}'"),
        )),
    }
}

fn validate_chain_config(config: &ChainConfig) -> std::result::Result<(), ValidationError> {
    if config.chain_id == 0 {
        return Err(ValidationError::new("chain_id", "must be greater than 0"));
    }

    if config.rpc_url.is_empty() {
        return Err(ValidationError::new("rpc_url", "must not be empty"));
    }

    if !config.rpc_url.starts_with("http://") && !config.rpc_url.starts_with("https://") {
        return Err(ValidationError::new(
            "rpc_url",
            "must start with http:// or https://",
        ));
    }

    if config.service_url.is_empty() {
        return Err(ValidationError::new("service_url", "must not be empty"));
    }

    if config.timeout_ms == 0 {
        return Err(ValidationError::new("timeout_ms", "must be greater than 0"));
    }

    Ok(())
}
