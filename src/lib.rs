//! # registry-rs
//!
//! User registry and quota accounting for VPN provisioning built on an
//! annotated Xray configuration document.
//!
//! The shared document doubles as an ad-hoc database: user identity and
//! expiry live in comment marker lines interleaved with the JSON client
//! lists, while byte quotas live in flat files keyed by protocol and
//! username. This workspace parses that document, reconciles it with the
//! quota files, derives lifecycle status, and appends new records safely
//! under an exclusive lock.
//!
//! ## Crates
//!
//! - [`registry_core`] - Domain types, annotation codec, client index, status engine
//! - [`registry_config`] - Configuration loading and validation
//! - [`registry_store`] - Quota files and the locked document store
//! - [`registry_service`] - Query and provisioning orchestration

pub use registry_config as config;
pub use registry_core as core;
pub use registry_service as service;
pub use registry_store as store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use registry_config::{load_config, validate_config, RegistryConfig};
    pub use registry_core::{Credential, Protocol, UserStatus, Variant};
    pub use registry_service::{RegistryError, RegistryService, UserListing, UserQuotaView};
}
