//! User records recovered from the annotated document and quota files.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::{Protocol, Variant};

/// A user identity recovered from the document's comment markers.
///
/// `(username, protocol)` is the natural key after de-duplication;
/// cross-protocol collisions are distinct users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRecord {
    pub username: String,
    pub protocol: Protocol,
    pub variant: Variant,
    /// `None` means the account never expires.
    pub expiry_date: Option<NaiveDate>,
}

/// Credential carried by a client object in the document's JSON body.
///
/// vmess/vless clients carry an `id` (UUID); trojan clients carry a
/// `password`. Serialized flattened, so a view gains either a `uuid` or a
/// `password` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credential {
    #[serde(rename = "uuid")]
    Uuid(String),
    #[serde(rename = "password")]
    Password(String),
}

impl Credential {
    /// Generate a fresh credential of the kind the protocol expects.
    pub fn generate(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Trojan => Credential::Password(Uuid::new_v4().to_string()),
            _ => Credential::Uuid(Uuid::new_v4().to_string()),
        }
    }

    /// Whether this credential kind is valid for the protocol.
    pub fn matches_protocol(&self, protocol: Protocol) -> bool {
        match self {
            Credential::Uuid(_) => protocol != Protocol::Trojan,
            Credential::Password(_) => protocol == Protocol::Trojan,
        }
    }

    /// The raw secret, regardless of kind.
    pub fn secret(&self) -> &str {
        match self {
            Credential::Uuid(s) | Credential::Password(s) => s,
        }
    }
}

/// A structured client record inside the parsed JSON client list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEntry {
    pub email: String,
    pub credential: Credential,
}

/// Per-user byte cap. Stored limits of zero or below mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaLimit {
    Unlimited,
    Bytes(i64),
}

impl QuotaLimit {
    /// Interpret a raw stored value: `<= 0` means unlimited.
    pub fn from_bytes(bytes: i64) -> Self {
        if bytes <= 0 {
            QuotaLimit::Unlimited
        } else {
            QuotaLimit::Bytes(bytes)
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, QuotaLimit::Unlimited)
    }
}

/// Quota limit plus usage for one user, as read from the flat files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub limit: QuotaLimit,
    pub used_bytes: i64,
}

impl QuotaState {
    /// State for a user with no quota files at all.
    pub fn unlimited() -> Self {
        QuotaState {
            limit: QuotaLimit::Unlimited,
            used_bytes: 0,
        }
    }
}

/// Derived lifecycle status. Never persisted; recomputed per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Expired,
    QuotaExceeded,
}
