//! Candidate classification
//!
//! Pure diffing of scanned source files against the manifest. The
//! classification consumes pre-computed fingerprints, so it is identical
//! regardless of which strategy (sequential or parallel) produced them.

use fontsync_config::Manifest;
use fontsync_types::FontFile;
use std::collections::HashMap;
use std::path::PathBuf;

/// Why a file was skipped this run (not an error; re-evaluated next run)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Lock-held by another process at scan time
    Locked,
    /// Flagged as an in-flight cloud transfer
    CloudSyncing,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "locked by another process"),
            Self::CloudSyncing => write!(f, "cloud sync in progress"),
        }
    }
}

/// A file that needs copying, with its freshly computed fingerprint
#[derive(Debug, Clone)]
pub struct SyncCandidate {
    /// Source path
    pub path: PathBuf,
    /// File name (the manifest key)
    pub name: String,
    /// Freshly computed content hash
    pub hash: String,
    /// Size in megabytes
    pub size_mb: f64,
}

/// Classified outcome of diffing a source scan against the manifest
#[derive(Debug, Default)]
pub struct SyncPlan {
    /// Files absent from the manifest
    pub install: Vec<SyncCandidate>,
    /// Files whose stored hash differs
    pub update: Vec<SyncCandidate>,
    /// Files whose stored hash matches
    pub up_to_date: Vec<PathBuf>,
    /// Files skipped this run, with the reason
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Per-file failures recorded during classification
    pub errors: Vec<String>,
}

impl SyncPlan {
    /// Number of copies this plan would perform
    pub fn total_actions(&self) -> usize {
        self.install.len() + self.update.len()
    }

    /// Whether the plan has any work to do
    pub fn has_work(&self) -> bool {
        self.total_actions() > 0
    }

    /// Megabytes the install+update candidates would copy
    pub fn required_mb(&self) -> f64 {
        self.install
            .iter()
            .chain(self.update.iter())
            .map(|c| c.size_mb)
            .sum()
    }
}

/// Fingerprint outcome per path: the hash, or a rendered failure
pub type FingerprintResults = HashMap<PathBuf, std::result::Result<String, String>>;

/// Classify scanned files against the manifest
///
/// Iterates `files` in order, so a sorted scan yields a deterministic
/// plan. Locked and cloud-syncing files are skipped without error; a file
/// whose fingerprint failed is recorded and excluded from this run.
pub fn classify(files: &[FontFile], hashes: &FingerprintResults, manifest: &Manifest) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for file in files {
        if file.locked {
            plan.skipped.push((file.path.clone(), SkipReason::Locked));
            continue;
        }
        if file.cloud_syncing {
            plan.skipped
                .push((file.path.clone(), SkipReason::CloudSyncing));
            continue;
        }

        let hash = match hashes.get(&file.path) {
            Some(Ok(hash)) => hash.clone(),
            Some(Err(message)) => {
                plan.errors.push(format!("{}: {}", file.name, message));
                continue;
            }
            None => {
                plan.errors
                    .push(format!("{}: fingerprint was not computed", file.name));
                continue;
            }
        };

        match manifest.stored_hash(&file.name) {
            None => plan.install.push(SyncCandidate {
                path: file.path.clone(),
                name: file.name.clone(),
                hash,
                size_mb: file.size_mb(),
            }),
            Some(stored) if stored != hash => plan.update.push(SyncCandidate {
                path: file.path.clone(),
                name: file.name.clone(),
                hash,
                size_mb: file.size_mb(),
            }),
            Some(_) => plan.up_to_date.push(file.path.clone()),
        }
    }

    plan
}
