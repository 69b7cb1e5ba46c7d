//! Stale-entry cleanup
//!
//! Classifies manifest entries that no longer correspond to reality: the
//! source file vanished, or the manifest claims an install the install
//! directory does not have. Both route to manifest-entry deletion once the
//! (optional) physical removal succeeds or is not needed; the reasons stay
//! distinguished for reporting.

use crate::engine::{error_detail, SyncEngine};
use crate::progress::{ProgressSink, ProgressUpdate, SyncPhase};
use chrono::{DateTime, Utc};
use fontsync_config::{Manifest, ManifestStore};
use fontsync_types::{CleanupReason, Result};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// A manifest entry eligible for removal
#[derive(Debug, Clone)]
pub struct CleanupCandidate {
    /// Manifest key (font file name)
    pub name: String,
    /// Why the entry is eligible
    pub reason: CleanupReason,
    /// When the font was recorded as installed
    pub installed_at: DateTime<Utc>,
}

/// Aggregate result of a cleanup run
#[derive(Debug, Clone, Serialize)]
pub struct CleanupSummary {
    /// Entries removed from the manifest
    pub removed: u64,
    /// Per-font failures, `name: message (hint)` form
    pub errors: Vec<String>,
    /// Whether this was a dry run (nothing mutated)
    pub dry_run: bool,
}

impl SyncEngine {
    /// Find manifest entries eligible for cleanup
    ///
    /// `source_names` is the set of file names present in the current
    /// source scan. Iteration follows manifest key order, so the result is
    /// deterministic.
    pub fn plan_cleanup(
        &self,
        manifest: &Manifest,
        source_names: &HashSet<String>,
    ) -> Vec<CleanupCandidate> {
        let mut candidates = Vec::new();

        for (name, entry) in &manifest.installed_fonts {
            if !source_names.contains(name) {
                candidates.push(CleanupCandidate {
                    name: name.clone(),
                    reason: CleanupReason::SourceRemoved,
                    installed_at: entry.installed_at,
                });
            } else if !self.installer().is_installed(name) {
                candidates.push(CleanupCandidate {
                    name: name.clone(),
                    reason: CleanupReason::MissingLocally,
                    installed_at: entry.installed_at,
                });
            }
        }

        candidates
    }

    /// Remove cleanup candidates from disk and from the manifest
    ///
    /// In dry-run mode nothing is mutated and the summary only echoes the
    /// mode. Otherwise each candidate's installed file is deleted when
    /// present (lock wait + retry per the removal policy); a deletion
    /// failure keeps the manifest entry and is recorded. The manifest is
    /// saved once at the end.
    pub async fn execute_cleanup(
        &self,
        candidates: &[CleanupCandidate],
        manifest: &mut Manifest,
        store: &ManifestStore,
        dry_run: bool,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<CleanupSummary> {
        let mut summary = CleanupSummary {
            removed: 0,
            errors: Vec::new(),
            dry_run,
        };

        if dry_run || candidates.is_empty() {
            return Ok(summary);
        }

        let total = candidates.len();
        for (index, candidate) in candidates.iter().enumerate() {
            if self.installer().is_installed(&candidate.name) {
                if let Err(e) = self.installer().remove(&candidate.name).await {
                    warn!("failed to remove {}: {}", candidate.name, e);
                    summary
                        .errors
                        .push(format!("{}: {}", candidate.name, error_detail(&e)));
                    continue;
                }
            }

            manifest.remove(&candidate.name);
            summary.removed += 1;

            if let Some(sink) = sink {
                sink.update(ProgressUpdate {
                    phase: SyncPhase::Cleaning,
                    completed: index + 1,
                    total,
                    detail: Some(candidate.name.clone()),
                });
            }
        }

        if let Err(e) = store.save(manifest).await {
            warn!("manifest save failed: {}", e);
            summary
                .errors
                .push(format!("manifest save failed: {}", error_detail(&e)));
        }

        info!(
            "cleanup removed {} entries ({} errors)",
            summary.removed,
            summary.errors.len()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontsync_types::SyncSettings;
    use tempfile::TempDir;

    fn engine_in(dir: &TempDir) -> SyncEngine {
        SyncEngine::new(SyncSettings {
            manifest_path: dir.path().join("config.json"),
            cache_dir: dir.path().join("cache"),
            install_dir: dir.path().join("installed"),
            cache_ttl_hours: 24,
        })
    }

    fn install(dir: &TempDir, name: &str) {
        let installed = dir.path().join("installed");
        std::fs::create_dir_all(&installed).unwrap();
        std::fs::write(installed.join(name), b"OTTO").unwrap();
    }

    #[test]
    fn test_cleanup_classification() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);

        let mut manifest = Manifest::new("/src");
        manifest.record_install("Gone.otf", "h1"); // absent from source
        manifest.record_install("Vanished.ttf", "h2"); // in source, not installed
        manifest.record_install("Fine.otf", "h3"); // in source and installed
        install(&dir, "Gone.otf");
        install(&dir, "Fine.otf");

        let source_names: HashSet<String> =
            ["Vanished.ttf", "Fine.otf"].iter().map(|s| s.to_string()).collect();

        let candidates = engine.plan_cleanup(&manifest, &source_names);

        assert_eq!(candidates.len(), 2);
        // BTreeMap order: Gone.otf before Vanished.ttf
        assert_eq!(candidates[0].name, "Gone.otf");
        assert_eq!(candidates[0].reason, CleanupReason::SourceRemoved);
        assert_eq!(candidates[1].name, "Vanished.ttf");
        assert_eq!(candidates[1].reason, CleanupReason::MissingLocally);
    }

    #[tokio::test]
    async fn test_dry_run_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let store = ManifestStore::new(dir.path().join("config.json"));

        let mut manifest = Manifest::new("/src");
        manifest.record_install("Gone.otf", "h1");
        install(&dir, "Gone.otf");

        let candidates = engine.plan_cleanup(&manifest, &HashSet::new());
        assert_eq!(candidates.len(), 1);

        let summary = engine
            .execute_cleanup(&candidates, &mut manifest, &store, true, None)
            .await
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.removed, 0);
        assert!(manifest.is_installed("Gone.otf"));
        assert!(dir.path().join("installed").join("Gone.otf").exists());
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_execute_removes_files_and_entries() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let store = ManifestStore::new(dir.path().join("config.json"));

        let mut manifest = Manifest::new("/src");
        manifest.record_install("Gone.otf", "h1");
        manifest.record_install("Vanished.ttf", "h2");
        install(&dir, "Gone.otf");

        let source_names: HashSet<String> =
            std::iter::once("Vanished.ttf".to_string()).collect();
        let candidates = engine.plan_cleanup(&manifest, &source_names);

        let summary = engine
            .execute_cleanup(&candidates, &mut manifest, &store, false, None)
            .await
            .unwrap();

        assert_eq!(summary.removed, 2);
        assert!(summary.errors.is_empty());
        assert!(!manifest.is_installed("Gone.otf"));
        assert!(!manifest.is_installed("Vanished.ttf"));
        assert!(!dir.path().join("installed").join("Gone.otf").exists());

        // Saved once at the end
        let reloaded = store.load().await.unwrap();
        assert!(reloaded.installed_fonts.is_empty());
    }
}
