//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

/// Bytes per gigabyte for quota display (fixed divisor, 1 GiB).
pub const BYTES_PER_GB: i64 = 1_073_741_824;

// ============================================================================
// Filesystem Defaults
// ============================================================================

/// Default path of the shared annotated configuration document.
pub const DEFAULT_DOCUMENT_PATH: &str = "/etc/xray/config.json";
/// Default root for per-user quota limit files (`<root>/<protocol>/<username>`).
pub const DEFAULT_QUOTA_ROOT: &str = "/etc";
/// Default root for per-user usage files (`<root>/<protocol>/<username>`).
pub const DEFAULT_USAGE_ROOT: &str = "/etc/limit";
/// Default root for per-user IP limit files (`<root>/<protocol>/ip/<username>`).
pub const DEFAULT_IP_LIMIT_ROOT: &str = "/etc/kyt/limit";

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Default bound on a single document or quota file I/O operation.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;
/// Default deadline for acquiring the exclusive document lock.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Provisioning Defaults
// ============================================================================

/// Default quota for new accounts, in GB (0 = unlimited).
pub const DEFAULT_QUOTA_GB: u64 = 100;
/// Default simultaneous-IP limit for new accounts.
pub const DEFAULT_IP_LIMIT: u32 = 3;
/// Default account validity in days.
pub const DEFAULT_VALIDITY_DAYS: u32 = 30;

// ============================================================================
// Validation Defaults
// ============================================================================

/// Minimum username length.
pub const MIN_USERNAME_LEN: usize = 3;
/// Maximum username length.
pub const MAX_USERNAME_LEN: usize = 20;
/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default port for the external API layer.
pub const DEFAULT_API_PORT: u16 = 8082;
