//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `registry_core::defaults`.

use registry_core::defaults;
use registry_core::Protocol;

/// Generate default value functions that forward to registry_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_io_timeout_ms   => DEFAULT_IO_TIMEOUT_MS: u64,
    default_lock_timeout_ms => DEFAULT_LOCK_TIMEOUT_MS: u64,
    default_port            => DEFAULT_API_PORT: u16,
}

default_string_fns! {
    default_document_path => DEFAULT_DOCUMENT_PATH,
    default_quota_root    => DEFAULT_QUOTA_ROOT,
    default_usage_root    => DEFAULT_USAGE_ROOT,
    default_ip_limit_root => DEFAULT_IP_LIMIT_ROOT,
}

pub(crate) fn default_protocols() -> Vec<Protocol> {
    Protocol::ALL.to_vec()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
