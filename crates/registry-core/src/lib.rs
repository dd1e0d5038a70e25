//! Domain logic for the user registry: the annotation codec, the client
//! index over the shared configuration document, quota arithmetic, and the
//! lifecycle status engine.
//!
//! This crate is pure and performs no I/O. Filesystem access lives in
//! `registry-store`; orchestration lives in `registry-service`.

pub mod codec;
pub mod defaults;
pub mod error;
pub mod index;
pub mod protocol;
pub mod quota;
pub mod record;
pub mod status;
pub mod validate;

pub use codec::{append_record, client_fragment, extract_records, strip_comments};
pub use error::{CodecError, InvalidProtocol};
pub use index::ClientIndex;
pub use protocol::{MarkerRule, Protocol, Variant, MARKER_RULES};
pub use quota::{bytes_to_gb, remaining_gb};
pub use record::{AnnotatedRecord, ClientEntry, Credential, QuotaLimit, QuotaState, UserStatus};
pub use status::classify;

/// Project name.
pub const PROJECT_NAME: &str = "registry-rs";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
