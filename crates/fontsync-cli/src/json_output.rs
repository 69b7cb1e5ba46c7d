//! JSON output documents for non-interactive consumption

use chrono::{DateTime, Utc};
use fontsync_types::{Error, SyncSummary};
use serde::Serialize;

/// One font in the `list --format json` document
#[derive(Debug, Serialize)]
pub struct FontListing {
    /// File name
    pub name: String,
    /// Source path
    pub path: String,
    /// Size in megabytes
    pub size_mb: f64,
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Whether the manifest records this font as installed
    pub is_installed: bool,
    /// Whether the source content differs from the installed hash
    pub needs_update: bool,
    /// When the font was installed, if it was
    pub installed_at: Option<DateTime<Utc>>,
}

/// The `list --format json` document
#[derive(Debug, Serialize)]
pub struct ListDocument {
    /// Configured source folder
    pub sync_folder: String,
    /// Number of fonts after filtering
    pub total_fonts: usize,
    /// The fonts themselves
    pub fonts: Vec<FontListing>,
}

/// Machine-readable summary for a run that aborted before completing
pub fn failure_summary(error: &Error) -> SyncSummary {
    let mut summary = SyncSummary::new();
    summary.success = false;
    summary.errors.push(match error.hint() {
        Some(hint) => format!("{error} ({hint})"),
        None => error.to_string(),
    });
    summary
}

/// Serialize any document as pretty JSON, falling back to an empty object
pub fn to_pretty_json<T: Serialize>(document: &T) -> String {
    serde_json::to_string_pretty(document).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_summary_shape() {
        let error = Error::config("manifest not found");
        let summary = failure_summary(&error);

        assert!(!summary.success);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.errors.len(), 1);

        let json = to_pretty_json(&summary);
        assert!(json.contains("\"success\": false"));
    }
}
