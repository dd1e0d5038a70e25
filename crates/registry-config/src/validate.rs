//! Configuration validation logic.

use crate::loader::ConfigError;
use crate::RegistryConfig;

pub fn validate_config(config: &RegistryConfig) -> Result<(), ConfigError> {
    if config.document_path.trim().is_empty() {
        return Err(ConfigError::Validation("document_path is empty".into()));
    }
    if config.quota_root.trim().is_empty() {
        return Err(ConfigError::Validation("quota_root is empty".into()));
    }
    if config.usage_root.trim().is_empty() {
        return Err(ConfigError::Validation("usage_root is empty".into()));
    }
    if config.ip_limit_root.trim().is_empty() {
        return Err(ConfigError::Validation("ip_limit_root is empty".into()));
    }
    if config.protocols.is_empty() {
        return Err(ConfigError::Validation(
            "protocols must name at least one protocol".into(),
        ));
    }
    for (i, protocol) in config.protocols.iter().enumerate() {
        if config.protocols[i + 1..].contains(protocol) {
            return Err(ConfigError::Validation(format!(
                "protocols lists {protocol} more than once"
            )));
        }
    }
    if config.io_timeout_ms == 0 {
        return Err(ConfigError::Validation("io_timeout_ms must be > 0".into()));
    }
    if config.lock_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "lock_timeout_ms must be > 0".into(),
        ));
    }
    if config.port == 0 {
        return Err(ConfigError::Validation("port must be > 0".into()));
    }
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of: {:?}",
            valid_levels
        )));
    }
    Ok(())
}
