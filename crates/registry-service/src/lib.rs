//! Registry orchestration.
//!
//! [`RegistryService`] answers single-user, all-users, and summary queries
//! against the annotated document and the quota file trees, and performs
//! append-style provisioning under an exclusive document lock.

pub mod cli;
mod error;
mod service;
mod view;

pub use error::{ProvisionStep, RegistryError};
pub use service::RegistryService;
pub use view::{
    GbAmount, ProtocolReport, ProvisionReceipt, Statistics, SummaryView, UserListing,
    UserQuotaView,
};
