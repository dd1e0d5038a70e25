//! Serializable query results.
//!
//! Field names and shapes match the JSON the external API layer exposes:
//! GB figures rounded to two decimals, `"Unlimited"` for uncapped users,
//! a flattened `uuid`/`password` credential field, and a statistics block
//! alongside bulk listings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use registry_core::{Credential, Protocol, UserStatus, Variant};

/// A GB figure that may be uncapped. Serializes as a number or the string
/// `"Unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GbAmount {
    Unlimited,
    Gb(f64),
}

impl Serialize for GbAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GbAmount::Unlimited => serializer.serialize_str("Unlimited"),
            GbAmount::Gb(v) => serializer.serialize_f64(*v),
        }
    }
}

impl From<Option<f64>> for GbAmount {
    fn from(value: Option<f64>) -> Self {
        value.map(GbAmount::Gb).unwrap_or(GbAmount::Unlimited)
    }
}

/// Merged read-only view of one user: annotated record, client entry,
/// quota state, and the derived status. Recomputed per query.
#[derive(Debug, Clone, Serialize)]
pub struct UserQuotaView {
    pub username: String,
    pub protocol: Protocol,
    pub variant: Variant,
    #[serde(flatten)]
    pub credential: Credential,
    pub quota_limit_gb: GbAmount,
    pub quota_used_gb: f64,
    pub quota_remaining_gb: GbAmount,
    pub is_unlimited: bool,
    pub status: UserStatus,
    pub expiry_date: Option<NaiveDate>,
}

/// Aggregate counts over a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_users: usize,
    pub active_users: usize,
    pub expired_users: usize,
    pub quota_exceeded_users: usize,
}

impl Statistics {
    pub fn tally(&mut self, status: UserStatus) {
        self.total_users += 1;
        match status {
            UserStatus::Active => self.active_users += 1,
            UserStatus::Expired => self.expired_users += 1,
            UserStatus::QuotaExceeded => self.quota_exceeded_users += 1,
        }
    }
}

/// All users plus aggregate counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserListing {
    pub users: Vec<UserQuotaView>,
    pub statistics: Statistics,
}

/// Per-protocol outcome inside a summary: counts, or the error that
/// prevented computing them (isolated per protocol).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProtocolReport {
    Stats(Statistics),
    Failed { error: String },
}

/// Per-protocol aggregate counts.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub protocols: BTreeMap<Protocol, ProtocolReport>,
}

/// Result of a successful provisioning call.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReceipt {
    pub username: String,
    pub protocol: Protocol,
    #[serde(flatten)]
    pub credential: Credential,
    pub expiry_date: NaiveDate,
    pub quota_gb: u64,
    pub ip_limit: u32,
}
