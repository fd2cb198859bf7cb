//! Default values and functions for configuration

/// Polling interval used when none is configured
pub const DEFAULT_INTERVAL_MS: u64 = 2_000;

pub(crate) fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

pub(crate) fn default_recursive() -> bool {
    false
}
