//! Configuration type definitions for registry paths, timeouts, and the
//! external API surface.

use serde::{Deserialize, Serialize};

use registry_core::Protocol;

use crate::defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path of the shared annotated configuration document.
    #[serde(default = "default_document_path")]
    pub document_path: String,
    /// Root for quota limit files (`<root>/<protocol>/<username>`).
    #[serde(default = "default_quota_root")]
    pub quota_root: String,
    /// Root for usage files (`<root>/<protocol>/<username>`).
    #[serde(default = "default_usage_root")]
    pub usage_root: String,
    /// Root for IP limit files (`<root>/<protocol>/ip/<username>`).
    #[serde(default = "default_ip_limit_root")]
    pub ip_limit_root: String,
    /// Protocols this deployment provisions and reports on.
    #[serde(default = "default_protocols")]
    pub protocols: Vec<Protocol>,
    /// Bound on a single document or quota-file I/O operation.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    /// Deadline for acquiring the exclusive document lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// API key consumed by the external HTTP layer.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Source IPs the external HTTP layer accepts.
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    /// Port the external HTTP layer listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            document_path: default_document_path(),
            quota_root: default_quota_root(),
            usage_root: default_usage_root(),
            ip_limit_root: default_ip_limit_root(),
            protocols: default_protocols(),
            io_timeout_ms: default_io_timeout_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
            api_key: None,
            allowed_ips: Vec::new(),
            port: default_port(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace/debug/info/warn/error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}
