//! The registry service: query and provisioning orchestration.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use registry_config::RegistryConfig;
use registry_core::defaults::BYTES_PER_GB;
use registry_core::validate::{valid_password, valid_username};
use registry_core::{
    append_record, bytes_to_gb, classify, client_fragment, extract_records, remaining_gb,
    AnnotatedRecord, ClientEntry, ClientIndex, CodecError, Credential, InvalidProtocol, Protocol,
    Variant,
};
use registry_store::{DocumentStore, QuotaFileStore};

use crate::error::{ProvisionStep, RegistryError};
use crate::view::{
    GbAmount, ProtocolReport, ProvisionReceipt, SummaryView, UserListing, UserQuotaView,
};

/// Orchestrates the codec, client index, quota store, and status engine.
///
/// Holds no shared mutable state; all coordination happens through the
/// filesystem, so independent instances (and processes) may serve
/// concurrently.
pub struct RegistryService {
    config: RegistryConfig,
    documents: DocumentStore,
    quotas: QuotaFileStore,
}

impl RegistryService {
    pub fn new(config: RegistryConfig) -> Self {
        let io_timeout = Duration::from_millis(config.io_timeout_ms);
        let lock_timeout = Duration::from_millis(config.lock_timeout_ms);
        let documents = DocumentStore::new(&config.document_path, io_timeout, lock_timeout);
        let quotas = QuotaFileStore::new(
            &config.quota_root,
            &config.usage_root,
            &config.ip_limit_root,
            io_timeout,
        );
        RegistryService {
            config,
            documents,
            quotas,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn parse_protocol(&self, protocol: &str) -> Result<Protocol, RegistryError> {
        let parsed: Protocol = protocol.parse()?;
        if !self.config.protocols.contains(&parsed) {
            return Err(InvalidProtocol(protocol.to_string()).into());
        }
        Ok(parsed)
    }

    /// Quota view for one user, keyed by `(protocol, username)`.
    ///
    /// Usernames are taken as-is: externally provisioned records may carry
    /// names outside the charset enforced at provisioning time, and those
    /// must stay queryable. `UserNotFound` covers an absent annotated
    /// record, a record whose JSON client was removed by an external
    /// delete, and a document that is missing or momentarily malformed.
    /// Quota-file hiccups degrade to unlimited/zero and never fail the
    /// call.
    pub async fn get_user(
        &self,
        protocol: &str,
        username: &str,
    ) -> Result<UserQuotaView, RegistryError> {
        let protocol = self.parse_protocol(protocol)?;
        let not_found = || RegistryError::UserNotFound {
            protocol,
            username: username.to_string(),
        };

        let text = self.documents.read().await?.ok_or_else(not_found)?;
        let records = extract_records(&text);
        let record = records
            .into_iter()
            .find(|r| r.protocol == protocol && r.username == username)
            .ok_or_else(not_found)?;

        let index = match ClientIndex::parse(&text) {
            Ok(index) => index,
            Err(e) => {
                warn!(document = %self.documents.path().display(), error = %e,
                    "document body unparsable, treating user as absent");
                return Err(not_found());
            }
        };
        let entry = index.resolve(username, protocol).ok_or_else(not_found)?;

        self.build_view(&record, entry, Local::now().naive_local())
            .await
    }

    /// All users, optionally filtered to one protocol, with aggregate
    /// counts. An absent or malformed document yields an empty listing.
    pub async fn get_all_users(
        &self,
        filter: Option<Protocol>,
    ) -> Result<UserListing, RegistryError> {
        let Some(text) = self.documents.read().await? else {
            warn!(document = %self.documents.path().display(), "document missing, empty listing");
            return Ok(UserListing::default());
        };
        let index = match ClientIndex::parse(&text) {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "document body unparsable, empty listing");
                return Ok(UserListing::default());
            }
        };

        let now = Local::now().naive_local();
        let mut listing = UserListing::default();
        for record in extract_records(&text) {
            if filter.is_some_and(|p| p != record.protocol) {
                continue;
            }
            if !self.config.protocols.contains(&record.protocol) {
                continue;
            }
            let Some(entry) = index.resolve(&record.username, record.protocol) else {
                debug!(username = %record.username, protocol = %record.protocol,
                    "annotated record has no client entry, skipping");
                continue;
            };
            let view = self.build_view(&record, entry, now).await?;
            listing.statistics.tally(view.status);
            listing.users.push(view);
        }
        Ok(listing)
    }

    /// Per-protocol aggregate counts. A failure for one protocol is
    /// embedded in that protocol's slot instead of failing the summary.
    pub async fn get_summary(&self) -> SummaryView {
        let mut protocols = BTreeMap::new();
        for &protocol in &self.config.protocols {
            let report = match self.get_all_users(Some(protocol)).await {
                Ok(listing) => ProtocolReport::Stats(listing.statistics),
                Err(e) => {
                    warn!(protocol = %protocol, error = %e, "summary failed for protocol");
                    ProtocolReport::Failed {
                        error: e.to_string(),
                    }
                }
            };
            protocols.insert(protocol, report);
        }
        SummaryView { protocols }
    }

    /// Provision a new account: append the annotated record (standard
    /// section, plus the grpc section when its anchor exists) under the
    /// exclusive document lock, then write the quota, IP-limit, and ledger
    /// files.
    ///
    /// Once the document is updated, any later failure surfaces as
    /// [`RegistryError::PartialProvision`] naming the failed step, so the
    /// caller can run compensating cleanup.
    pub async fn provision_user(
        &self,
        protocol: &str,
        username: &str,
        credential: Credential,
        expiry: NaiveDate,
        quota_gb: u64,
        ip_limit: u32,
    ) -> Result<ProvisionReceipt, RegistryError> {
        let protocol = self.parse_protocol(protocol)?;
        if !valid_username(username) {
            return Err(RegistryError::InvalidUsername(username.to_string()));
        }
        if !credential.matches_protocol(protocol) {
            return Err(RegistryError::CredentialMismatch(protocol));
        }
        if let Credential::Password(password) = &credential {
            if !valid_password(password) {
                return Err(RegistryError::InvalidPassword);
            }
        }

        self.append_to_document(protocol, username.to_string(), credential.clone(), expiry)
            .await?;

        let limit_bytes = i64::try_from(quota_gb)
            .unwrap_or(i64::MAX)
            .saturating_mul(BYTES_PER_GB);
        self.quotas
            .write_limit(protocol, username, limit_bytes)
            .await
            .map_err(|source| RegistryError::PartialProvision {
                step: ProvisionStep::QuotaLimit,
                document_updated: true,
                source,
            })?;
        self.quotas
            .write_ip_limit(protocol, username, ip_limit)
            .await
            .map_err(|source| RegistryError::PartialProvision {
                step: ProvisionStep::IpLimit,
                document_updated: true,
                source,
            })?;
        self.quotas
            .append_ledger(protocol, username, expiry, credential.secret())
            .await
            .map_err(|source| RegistryError::PartialProvision {
                step: ProvisionStep::Ledger,
                document_updated: true,
                source,
            })?;

        info!(username, protocol = %protocol, expiry = %expiry, quota_gb, ip_limit,
            "provisioned user");
        Ok(ProvisionReceipt {
            username: username.to_string(),
            protocol,
            credential,
            expiry_date: expiry,
            quota_gb,
            ip_limit,
        })
    }

    /// Run the locked read-modify-write cycle on the document.
    async fn append_to_document(
        &self,
        protocol: Protocol,
        username: String,
        credential: Credential,
        expiry: NaiveDate,
    ) -> Result<(), RegistryError> {
        let documents = self.documents.clone();
        tokio::task::spawn_blocking(move || -> Result<(), RegistryError> {
            let lock = documents.lock_exclusive()?;
            let text = documents.read_blocking(&lock)?.ok_or_else(|| {
                RegistryError::Io(std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("document {} does not exist", documents.path().display()),
                ))
            })?;

            let records = extract_records(&text);
            if records
                .iter()
                .any(|r| r.protocol == protocol && r.username == username)
            {
                return Err(RegistryError::UserExists { protocol, username });
            }

            let fragment = client_fragment(protocol, &username, &credential);
            let mut updated = append_record(
                &text,
                protocol,
                Variant::Standard,
                &username,
                expiry,
                &fragment,
            )?;
            // Mirror the entry into the grpc section when the document has one.
            match append_record(&updated, protocol, Variant::Grpc, &username, expiry, &fragment)
            {
                Ok(with_grpc) => updated = with_grpc,
                Err(CodecError::AnchorNotFound(anchor)) => {
                    debug!(anchor, "no grpc section, standard entry only");
                }
                Err(e) => return Err(e.into()),
            }

            documents.write_blocking(&lock, &updated)?;
            Ok(())
        })
        .await
        .map_err(|e| RegistryError::Task(e.to_string()))?
    }

    async fn build_view(
        &self,
        record: &AnnotatedRecord,
        entry: ClientEntry,
        now: NaiveDateTime,
    ) -> Result<UserQuotaView, RegistryError> {
        let limit = self
            .quotas
            .read_limit(record.protocol, &record.username)
            .await?;
        let used_bytes = self
            .quotas
            .read_used(record.protocol, &record.username)
            .await?;
        let status = classify(limit, used_bytes, record.expiry_date, now);

        let quota_limit_gb = match limit {
            registry_core::QuotaLimit::Unlimited => GbAmount::Unlimited,
            registry_core::QuotaLimit::Bytes(bytes) => GbAmount::Gb(bytes_to_gb(bytes)),
        };
        Ok(UserQuotaView {
            username: record.username.clone(),
            protocol: record.protocol,
            variant: record.variant,
            credential: entry.credential,
            quota_limit_gb,
            quota_used_gb: bytes_to_gb(used_bytes),
            quota_remaining_gb: GbAmount::from(remaining_gb(limit, used_bytes)),
            is_unlimited: limit.is_unlimited(),
            status,
            expiry_date: record.expiry_date,
        })
    }
}
