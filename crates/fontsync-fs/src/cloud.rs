//! Cloud-storage sync detection
//!
//! Best-effort heuristic: the predicate looks at path and filename
//! patterns only, never at filesystem attributes, so it can miss real sync
//! state and must only be used to *exclude* files, never as a guarantee.

use std::path::Path;

/// iCloud placeholder marker that appears as a path segment while a file
/// has not been materialized locally
const CLOUD_PLACEHOLDER_MARKER: &str = ".icloud";

/// Filename suffixes that indicate an in-flight transfer
const IN_FLIGHT_SUFFIXES: [&str; 4] = [".tmp", ".download", ".partial", "~"];

/// Check whether a path looks like it is currently being synchronized by a
/// cloud-storage client
pub fn is_cloud_syncing<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref().to_string_lossy();

    if path.contains(CLOUD_PLACEHOLDER_MARKER) {
        return true;
    }

    IN_FLIGHT_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}
