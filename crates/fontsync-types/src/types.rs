//! Core data types for fontsync
//!
//! Plain records passed between the scanner, the reconciliation engine, and
//! the presentation layer. Everything here is data; behavior lives in the
//! crates that produce these values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A font file discovered by a source-folder scan
///
/// Ephemeral: derived from the filesystem on every scan, never persisted.
#[derive(Debug, Clone)]
pub struct FontFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File name including extension
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Whether the file was lock-held at scan time
    pub locked: bool,
    /// Whether a cloud-sync heuristic flagged the file as in flight
    pub cloud_syncing: bool,
}

impl FontFile {
    /// Size in megabytes
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

/// Classification of a source file against the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    /// Name absent from the manifest
    Install,
    /// Name present but the stored hash differs
    Update,
    /// Name present and the stored hash matches
    UpToDate,
}

/// Aggregate result of one reconciliation run
///
/// This is the machine-readable summary contract: serialized as
/// `{success, added, updated, skipped, errors}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Whether the run completed (possibly with per-file errors)
    pub success: bool,
    /// Number of fonts newly installed
    pub added: u64,
    /// Number of fonts updated in place
    pub updated: u64,
    /// Number of fonts already up to date
    pub skipped: u64,
    /// Per-file error descriptions, `name: message (hint)` form
    pub errors: Vec<String>,
}

impl SyncSummary {
    /// Create an empty successful summary
    pub fn new() -> Self {
        Self {
            success: true,
            added: 0,
            updated: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }
}

impl Default for SyncSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Disk-space report for a target directory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskSpace {
    /// Free space in megabytes (-1.0 when unknown)
    pub free_mb: f64,
    /// Total volume size in megabytes (-1.0 when unknown)
    pub total_mb: f64,
    /// Used percentage (-1.0 when unknown)
    pub used_percent: f64,
    /// Whether the queried requirement fits in the free space
    pub sufficient: bool,
}

impl DiskSpace {
    /// Sentinel for an unanswerable query: unknown but assumed sufficient
    ///
    /// A failed space probe must never fail the caller, so the sentinel
    /// reports `sufficient` and negative magnitudes.
    pub fn unknown() -> Self {
        Self {
            free_mb: -1.0,
            total_mb: -1.0,
            used_percent: -1.0,
            sufficient: true,
        }
    }

    /// Whether the magnitudes in this report are real measurements
    pub fn is_known(&self) -> bool {
        self.free_mb >= 0.0
    }
}

/// Outcome of advanced font-file validation
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Whether the file passed all fatal checks
    pub valid: bool,
    /// Non-fatal findings (oversized file, unknown header, lock contention)
    pub warnings: Vec<String>,
    /// File size in megabytes
    pub size_mb: f64,
    /// Whether the file was lock-held at validation time
    pub locked: bool,
}

/// Why a manifest entry is eligible for cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanupReason {
    /// The font no longer exists in the source folder
    SourceRemoved,
    /// The manifest records an install but the file is gone locally
    MissingLocally,
}

impl std::fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceRemoved => write!(f, "removed from source folder"),
            Self::MissingLocally => write!(f, "missing from install directory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_file_size_mb() {
        let file = FontFile {
            path: PathBuf::from("/fonts/A.otf"),
            name: "A.otf".to_string(),
            size: 2 * 1024 * 1024,
            modified: SystemTime::now(),
            locked: false,
            cloud_syncing: false,
        };
        assert!((file.size_mb() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disk_space_sentinel() {
        let unknown = DiskSpace::unknown();
        assert!(unknown.sufficient);
        assert!(!unknown.is_known());
    }

    #[test]
    fn test_summary_machine_readable_shape() {
        let mut summary = SyncSummary::new();
        summary.added = 1;
        summary.errors.push("B.ttf: file is locked".to_string());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["added"], 1);
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_cleanup_reason_display() {
        assert_eq!(
            CleanupReason::SourceRemoved.to_string(),
            "removed from source folder"
        );
        assert_eq!(
            CleanupReason::MissingLocally.to_string(),
            "missing from install directory"
        );
    }
}
