//! Configuration loading and validation for the registry.
//!
//! The configuration file carries the registry paths, the supported
//! protocol set, I/O and lock timeouts, and the surface consumed by the
//! external HTTP layer (`api_key`, `allowed_ips`, `port`). Formats:
//! JSON/JSONC, YAML, TOML, selected by file extension.

mod defaults;
mod loader;
mod types;
mod validate;

pub use loader::{load_config, ConfigError};
pub use types::{LoggingConfig, RegistryConfig};
pub use validate::validate_config;
