//! Byte-to-GB conversion for quota display.

use crate::defaults::BYTES_PER_GB;
use crate::record::QuotaLimit;

/// Convert a byte count to GB, rounded to two decimal places.
///
/// The same divisor and rounding apply to single-user and bulk queries.
pub fn bytes_to_gb(bytes: i64) -> f64 {
    let gb = bytes as f64 / BYTES_PER_GB as f64;
    (gb * 100.0).round() / 100.0
}

/// Remaining quota in GB, clamped at zero; `None` when the limit is
/// unlimited.
pub fn remaining_gb(limit: QuotaLimit, used_bytes: i64) -> Option<f64> {
    match limit {
        QuotaLimit::Unlimited => None,
        QuotaLimit::Bytes(limit_bytes) => {
            Some(bytes_to_gb((limit_bytes - used_bytes).max(0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_gb_values_round_trip() {
        assert_eq!(bytes_to_gb(BYTES_PER_GB), 1.0);
        assert_eq!(bytes_to_gb(5 * BYTES_PER_GB), 5.0);
        assert_eq!(bytes_to_gb(0), 0.0);
    }

    #[test]
    fn fractional_values_round_to_two_decimals() {
        assert_eq!(bytes_to_gb(BYTES_PER_GB / 2), 0.5);
        assert_eq!(bytes_to_gb(BYTES_PER_GB / 3), 0.33);
    }

    #[test]
    fn remaining_clamps_at_zero() {
        assert_eq!(remaining_gb(QuotaLimit::Bytes(BYTES_PER_GB), 2 * BYTES_PER_GB), Some(0.0));
        assert_eq!(
            remaining_gb(QuotaLimit::Bytes(5 * BYTES_PER_GB), BYTES_PER_GB),
            Some(4.0)
        );
        assert_eq!(remaining_gb(QuotaLimit::Unlimited, BYTES_PER_GB), None);
    }
}
