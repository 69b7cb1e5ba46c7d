//! Persisted installation manifest for fontsync
//!
//! The manifest is the single source of truth for what this machine has
//! installed: a JSON document mapping font file names to the content hash
//! and timestamp recorded at install time, alongside the configured source
//! folder. It is loaded fully into memory, mutated in place by the
//! reconciliation engine, and written back atomically as a whole document.
//!
//! The manifest intentionally does not track the install directory's actual
//! contents; external deletion is possible and is exactly what the cleanup
//! flow detects.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use chrono::{DateTime, Utc};
use fontsync_types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Manifest schema version written to new documents
pub const MANIFEST_VERSION: &str = "1.0";

/// One installed font as recorded at sync time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Content hash of the source file when it was installed
    pub hash: String,
    /// When the install happened
    pub installed_at: DateTime<Utc>,
}

/// The persisted manifest document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Source folder fonts are synchronized from
    pub sync_folder: String,
    /// Installed fonts keyed by file name
    ///
    /// Keys are file names, not paths: same-named files from different
    /// source subdirectories collide here. Preserved behavior.
    #[serde(default)]
    pub installed_fonts: BTreeMap<String, ManifestEntry>,
    /// When the manifest was first created
    pub created_at: DateTime<Utc>,
    /// Schema version
    pub version: String,
}

impl Manifest {
    /// Create a fresh manifest for the given source folder
    pub fn new<S: Into<String>>(sync_folder: S) -> Self {
        Self {
            sync_folder: sync_folder.into(),
            installed_fonts: BTreeMap::new(),
            created_at: Utc::now(),
            version: MANIFEST_VERSION.to_string(),
        }
    }

    /// The configured source folder as a path
    ///
    /// Fails with a configuration error when the field is empty, distinct
    /// from the manifest file itself being missing.
    pub fn sync_folder_path(&self) -> Result<PathBuf> {
        if self.sync_folder.is_empty() {
            return Err(Error::config("no sync folder configured"));
        }
        Ok(PathBuf::from(&self.sync_folder))
    }

    /// Record a successful install or update
    pub fn record_install(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.installed_fonts.insert(
            name.into(),
            ManifestEntry {
                hash: hash.into(),
                installed_at: Utc::now(),
            },
        );
    }

    /// Remove an entry; returns whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.installed_fonts.remove(name).is_some()
    }

    /// Look up the entry for a font name
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.installed_fonts.get(name)
    }

    /// Whether a font name has been recorded as installed
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed_fonts.contains_key(name)
    }

    /// The stored hash for a font name, if recorded
    pub fn stored_hash(&self, name: &str) -> Option<&str> {
        self.installed_fonts.get(name).map(|e| e.hash.as_str())
    }
}

/// Loads and saves the manifest document
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    /// Create a store for the given manifest path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the manifest document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the manifest document exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the manifest
    ///
    /// A missing document is a configuration error (the precondition every
    /// command checks first), not an I/O error.
    pub async fn load(&self) -> Result<Manifest> {
        if !self.exists() {
            return Err(Error::config(format!(
                "manifest not found: {}",
                self.path.display()
            )));
        }

        let data = fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::from_io(&self.path, e))?;

        let manifest: Manifest = serde_json::from_str(&data).map_err(|e| {
            Error::config(format!(
                "manifest is not valid JSON ({}): {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(
            "loaded manifest with {} installed fonts",
            manifest.installed_fonts.len()
        );
        Ok(manifest)
    }

    /// Write the manifest back as a whole document
    ///
    /// Serialized with 2-space indentation, UTF-8, non-ASCII preserved.
    /// The write goes to a sibling temp file first and is renamed into
    /// place, so readers never observe a partial document.
    pub async fn save(&self, manifest: &Manifest) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::from_io(parent, e))?;
        }

        let mut data = serde_json::to_string_pretty(manifest)
            .map_err(|e| Error::io(format!("failed to serialize manifest: {}", e)))?;
        data.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .await
            .map_err(|e| Error::from_io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::from_io(&self.path, e))?;

        debug!(
            "saved manifest with {} installed fonts",
            manifest.installed_fonts.len()
        );
        Ok(())
    }

    /// Create and persist a fresh manifest for the given source folder
    pub async fn create<S: Into<String>>(&self, sync_folder: S) -> Result<Manifest> {
        let manifest = Manifest::new(sync_folder);
        self.save(&manifest).await?;
        info!("initialized manifest at {}", self.path.display());
        Ok(manifest)
    }
}
