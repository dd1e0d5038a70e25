//! Per-protocol, per-user quota files.
//!
//! Layout (all plain text, single decimal value per file):
//! - limit:    `<quota_root>/<protocol>/<username>`
//! - used:     `<usage_root>/<protocol>/<username>`
//! - IP limit: `<ip_limit_root>/<protocol>/ip/<username>`
//!
//! Absence is meaningful: no limit file means unlimited, no usage file
//! means zero. Non-numeric content is logged and degraded to the unset
//! value; it never fails a request. Genuine I/O errors (permissions, disk)
//! do surface.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::warn;

use registry_core::{Protocol, QuotaLimit};

use crate::error::StoreError;

/// Reads and writes the per-user quota scalar files.
#[derive(Debug, Clone)]
pub struct QuotaFileStore {
    quota_root: PathBuf,
    usage_root: PathBuf,
    ip_limit_root: PathBuf,
    io_timeout: Duration,
}

impl QuotaFileStore {
    pub fn new(
        quota_root: impl Into<PathBuf>,
        usage_root: impl Into<PathBuf>,
        ip_limit_root: impl Into<PathBuf>,
        io_timeout: Duration,
    ) -> Self {
        QuotaFileStore {
            quota_root: quota_root.into(),
            usage_root: usage_root.into(),
            ip_limit_root: ip_limit_root.into(),
            io_timeout,
        }
    }

    fn limit_path(&self, protocol: Protocol, username: &str) -> PathBuf {
        self.quota_root.join(protocol.as_str()).join(username)
    }

    fn usage_path(&self, protocol: Protocol, username: &str) -> PathBuf {
        self.usage_root.join(protocol.as_str()).join(username)
    }

    fn ip_limit_path(&self, protocol: Protocol, username: &str) -> PathBuf {
        self.ip_limit_root
            .join(protocol.as_str())
            .join("ip")
            .join(username)
    }

    fn ledger_path(&self, protocol: Protocol) -> PathBuf {
        self.quota_root
            .join(protocol.as_str())
            .join(format!(".{}.db", protocol.as_str()))
    }

    /// Byte cap for a user. Missing or unreadable content means unlimited.
    pub async fn read_limit(
        &self,
        protocol: Protocol,
        username: &str,
    ) -> Result<QuotaLimit, StoreError> {
        let path = self.limit_path(protocol, username);
        Ok(self
            .read_scalar(&path)
            .await?
            .map(QuotaLimit::from_bytes)
            .unwrap_or(QuotaLimit::Unlimited))
    }

    /// Bytes consumed by a user. Missing or unreadable content means zero.
    pub async fn read_used(&self, protocol: Protocol, username: &str) -> Result<i64, StoreError> {
        let path = self.usage_path(protocol, username);
        Ok(self.read_scalar(&path).await?.unwrap_or(0))
    }

    /// Overwrite the limit file. A value of zero or below reads back as
    /// unlimited.
    pub async fn write_limit(
        &self,
        protocol: Protocol,
        username: &str,
        limit_bytes: i64,
    ) -> Result<(), StoreError> {
        let path = self.limit_path(protocol, username);
        self.write_scalar(&path, limit_bytes.to_string()).await
    }

    /// Overwrite the usage file.
    pub async fn write_used(
        &self,
        protocol: Protocol,
        username: &str,
        used_bytes: i64,
    ) -> Result<(), StoreError> {
        let path = self.usage_path(protocol, username);
        self.write_scalar(&path, used_bytes.to_string()).await
    }

    /// Overwrite the simultaneous-IP limit file.
    pub async fn write_ip_limit(
        &self,
        protocol: Protocol,
        username: &str,
        ip_limit: u32,
    ) -> Result<(), StoreError> {
        let path = self.ip_limit_path(protocol, username);
        self.write_scalar(&path, ip_limit.to_string()).await
    }

    /// Append a provisioning line to the protocol's ledger file
    /// (`<quota_root>/<protocol>/.<protocol>.db`).
    pub async fn append_ledger(
        &self,
        protocol: Protocol,
        username: &str,
        expiry: NaiveDate,
        secret: &str,
    ) -> Result<(), StoreError> {
        let path = self.ledger_path(protocol);
        if let Some(parent) = path.parent() {
            self.bounded("ledger mkdir", fs::create_dir_all(parent))
                .await??;
        }
        let line = format!(
            "{} {} {} {}\n",
            protocol.glyph(),
            username,
            expiry.format("%Y-%m-%d"),
            secret
        );
        let mut file = self
            .bounded(
                "ledger open",
                fs::OpenOptions::new().create(true).append(true).open(&path),
            )
            .await??;
        self.bounded("ledger write", file.write_all(line.as_bytes()))
            .await??;
        self.bounded("ledger flush", file.flush()).await??;
        Ok(())
    }

    /// Read a single decimal value. `Ok(None)` covers every recoverable
    /// case: file absent, empty, or non-numeric (logged).
    async fn read_scalar(&self, path: &Path) -> Result<Option<i64>, StoreError> {
        let read = self.bounded("quota read", fs::read_to_string(path)).await?;
        let content = match read {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<i64>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!(path = %path.display(), "non-numeric quota file content, using default");
                Ok(None)
            }
        }
    }

    /// Atomic single-value overwrite: write to a temp file, then rename,
    /// so concurrent readers never observe a truncated file.
    async fn write_scalar(&self, path: &Path, value: String) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            self.bounded("quota mkdir", fs::create_dir_all(parent))
                .await??;
        }
        let tmp = tmp_path(path);
        self.bounded("quota write", fs::write(&tmp, value)).await??;
        self.bounded("quota rename", fs::rename(&tmp, path)).await??;
        Ok(())
    }

    async fn bounded<F, T>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = T>,
    {
        timeout(self.io_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout {
                op,
                timeout: self.io_timeout,
            })
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".tmp.{}", std::process::id()));
    path.with_file_name(name)
}
