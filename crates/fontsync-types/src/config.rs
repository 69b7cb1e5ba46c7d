//! Configuration types for fontsync
//!
//! Retry policies and the settings struct injected into every component.
//! Nothing here touches the environment; path resolution happens once at
//! the CLI boundary, which keeps every component hermetically testable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry configuration for transient I/O failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Policy used by content fingerprinting: 3 attempts, 500 ms initial
    /// backoff doubling per retry
    pub fn for_fingerprint() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        }
    }

    /// Policy used by font removal: 3 attempts, 1 s initial backoff
    pub fn for_remove() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }

    /// Total number of attempts including the first
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculate the delay before the retry following attempt `attempt`
    /// (zero-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(millis as u64)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::for_fingerprint()
    }
}

/// Locations and policies every fontsync component works against
///
/// Constructed once (by the CLI from the user's home directory, or by tests
/// from a temp directory) and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Path of the persisted manifest document
    pub manifest_path: PathBuf,
    /// Directory holding the fingerprint-cache documents
    pub cache_dir: PathBuf,
    /// Directory fonts are installed into
    pub install_dir: PathBuf,
    /// Fingerprint-cache time-to-live in hours; a value <= 0 never expires
    pub cache_ttl_hours: i64,
}

impl SyncSettings {
    /// Default cache TTL
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    /// Settings rooted at the given home directory
    ///
    /// Manifest and cache live under `<home>/.fontsync`, fonts install into
    /// `<home>/Library/Fonts`.
    pub fn for_home<P: AsRef<Path>>(home: P) -> Self {
        let home = home.as_ref();
        let data_dir = home.join(".fontsync");
        Self {
            manifest_path: data_dir.join("config.json"),
            cache_dir: data_dir.join("cache"),
            install_dir: home.join("Library").join("Fonts"),
            cache_ttl_hours: Self::DEFAULT_TTL_HOURS,
        }
    }

    /// Override the install directory
    pub fn with_install_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.install_dir = dir.as_ref().to_path_buf();
        self
    }
}
