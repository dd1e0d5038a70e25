//! Codec and protocol error types.

/// Error raised when decoding or mutating the annotated document.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The document body, after comment stripping, is not valid JSON.
    ///
    /// Callers on query paths must treat this as "zero records": the
    /// document may have been observed mid-write by a concurrent
    /// provisioning operation.
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// The anchor line for a protocol/variant section is missing, so there
    /// is nowhere to insert a new record.
    #[error("anchor {0:?} not found in document")]
    AnchorNotFound(&'static str),
}

/// A protocol name outside the supported set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid protocol {0:?} (expected vmess, vless or trojan)")]
pub struct InvalidProtocol(pub String);
