//! # Config - Prolog segment settings
//!
//! Plain configuration structs shared by the index and the shell. Nothing
//! here is validated; the index checks the values it needs when it opens.
//!
//! ## Environment
//!
//! ```text
//! PROLOG_MAX_INDEX_BYTES  Pre-allocated index size in bytes (default: 1048572)
//! PROLOG_INDEX_SYNC       Flush every index write           (default: "false")
//! ```

/// Default pre-allocated size of one index file: the largest whole number of
/// 12-byte entries that fits in 1 MiB.
pub const DEFAULT_MAX_INDEX_BYTES: u64 = 87_381 * 12;

/// Environment variable holding [`SegmentConfig::max_index_bytes`].
pub const ENV_MAX_INDEX_BYTES: &str = "PROLOG_MAX_INDEX_BYTES";

/// Environment variable holding [`SegmentConfig::sync_writes`].
pub const ENV_INDEX_SYNC: &str = "PROLOG_INDEX_SYNC";

/// Per-segment limits supplied by the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentConfig {
    /// Size the index file is pre-allocated (and mapped) to. The index can
    /// hold `max_index_bytes / 12` entries before `write` reports EOF.
    pub max_index_bytes: u64,
    /// If true, every index write flushes the touched pages before returning.
    pub sync_writes: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_index_bytes: DEFAULT_MAX_INDEX_BYTES,
            sync_writes: false,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Limits applied to every segment.
    pub segment: SegmentConfig,
}

impl Config {
    /// Builds a config from the process environment, falling back to the
    /// defaults for unset or unparsable variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead so
    /// they never mutate the shared process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SegmentConfig::default();
        let max_index_bytes = lookup(ENV_MAX_INDEX_BYTES)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.max_index_bytes);
        let sync_writes = lookup(ENV_INDEX_SYNC)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.sync_writes);

        Self {
            segment: SegmentConfig {
                max_index_bytes,
                sync_writes,
            },
        }
    }

    /// Shorthand for a config that only sets the index size.
    pub fn with_max_index_bytes(max_index_bytes: u64) -> Self {
        Self {
            segment: SegmentConfig {
                max_index_bytes,
                ..SegmentConfig::default()
            },
        }
    }
}
