//! Filesystem access for the registry.
//!
//! Two shared mutable resources live on disk: the annotated configuration
//! document and the per-user quota files. Reads are timeout-bounded and
//! tolerate concurrent writers; document mutation happens under an
//! exclusive advisory lock, and every write is temp-file + rename so
//! readers never observe a truncated file.

mod document;
mod error;
mod quota;

pub use document::{DocumentLock, DocumentStore};
pub use error::StoreError;
pub use quota::QuotaFileStore;
