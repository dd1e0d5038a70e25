//! Registry error types.

use std::fmt;
use std::time::Duration;

use registry_core::{CodecError, InvalidProtocol, Protocol};
use registry_store::StoreError;

/// The provisioning sub-step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    QuotaLimit,
    IpLimit,
    Ledger,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionStep::QuotaLimit => f.write_str("quota limit file"),
            ProvisionStep::IpLimit => f.write_str("ip limit file"),
            ProvisionStep::Ledger => f.write_str("ledger append"),
        }
    }
}

/// Registry error type.
///
/// Parsing and quota-read anomalies are recovered internally to
/// conservative defaults and never appear here; what does appear requires
/// caller-visible handling.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidProtocol(#[from] InvalidProtocol),

    #[error("invalid username {0:?} (3-20 characters, [A-Za-z0-9_])")]
    InvalidUsername(String),

    #[error("password too short (minimum 8 characters)")]
    InvalidPassword,

    #[error("credential kind does not match protocol {0}")]
    CredentialMismatch(Protocol),

    #[error("user {username:?} not found for protocol {protocol}")]
    UserNotFound {
        protocol: Protocol,
        username: String,
    },

    #[error("user {username:?} already provisioned for protocol {protocol}")]
    UserExists {
        protocol: Protocol,
        username: String,
    },

    /// Document mutation failure (e.g. a missing anchor section).
    #[error("document: {0}")]
    Codec(#[from] CodecError),

    #[error("document lock not acquired within {timeout:?}")]
    LockTimeout { timeout: Duration },

    #[error("{op} timed out after {timeout:?}")]
    Timeout {
        op: &'static str,
        timeout: Duration,
    },

    /// The document was appended but a later step failed; the caller must
    /// attempt compensating cleanup.
    #[error("provisioning failed at {step} (document updated: {document_updated}): {source}")]
    PartialProvision {
        step: ProvisionStep,
        document_updated: bool,
        #[source]
        source: StoreError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("task failure: {0}")]
    Task(String),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => RegistryError::Io(e),
            StoreError::Timeout { op, timeout } => RegistryError::Timeout { op, timeout },
            StoreError::LockTimeout { timeout } => RegistryError::LockTimeout { timeout },
        }
    }
}
