//! Lifecycle status derivation.
//!
//! The precedence is fixed: quota exhaustion is evaluated before expiry,
//! so a user who is both over quota and past expiry reports
//! `quota_exceeded`. Every caller computes status through this function.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::record::{QuotaLimit, UserStatus};

/// Classify a user from quota state and expiry.
///
/// - finite limit and `used >= limit` ⇒ [`UserStatus::QuotaExceeded`]
/// - expiry present and `now` past midnight of that date ⇒ [`UserStatus::Expired`]
/// - otherwise [`UserStatus::Active`]
///
/// `None` expiry means the account never expires.
pub fn classify(
    limit: QuotaLimit,
    used_bytes: i64,
    expiry: Option<NaiveDate>,
    now: NaiveDateTime,
) -> UserStatus {
    if let QuotaLimit::Bytes(limit_bytes) = limit {
        if used_bytes >= limit_bytes {
            return UserStatus::QuotaExceeded;
        }
    }
    if let Some(expiry) = expiry {
        if now > expiry.and_time(NaiveTime::MIN) {
            return UserStatus::Expired;
        }
    }
    UserStatus::Active
}
