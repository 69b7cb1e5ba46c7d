//! Font catalog scanning
//!
//! Recursively discovers font files under a source folder, excluding
//! dotfiles and anything the cloud-sync heuristic flags. The eager scan
//! returns one lexicographically sorted collection; the batch scan is a
//! lazy iterator yielding groups of up to [`SCAN_BATCH_SIZE`] paths, each
//! group internally sorted, in discovery order across extensions.

use crate::cloud::is_cloud_syncing;
use crate::locks::is_locked;
use fontsync_types::{Error, FontFile, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Recognized font extensions, both case forms
pub const FONT_EXTENSIONS: [&str; 4] = ["otf", "ttf", "OTF", "TTF"];

/// Number of paths per batch in batch-scan mode
pub const SCAN_BATCH_SIZE: usize = 100;

/// Recursive font-file scanner
#[derive(Debug, Clone)]
pub struct FontScanner {
    extensions: Vec<String>,
}

impl FontScanner {
    /// Scanner for the standard font extensions
    pub fn new() -> Self {
        Self {
            extensions: FONT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Scan a folder and return every font path, sorted
    pub fn scan<P: AsRef<Path>>(&self, folder: P) -> Result<Vec<PathBuf>> {
        let folder = folder.as_ref();
        check_folder(folder)?;

        let mut fonts: Vec<PathBuf> = WalkDir::new(folder)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| self.is_eligible(path, None))
            .collect();

        fonts.sort();
        debug!("scanned {} fonts under {}", fonts.len(), folder.display());
        Ok(fonts)
    }

    /// Scan a folder lazily, yielding batches of up to [`SCAN_BATCH_SIZE`]
    /// paths
    ///
    /// One walk per extension form, so batches arrive in discovery order
    /// across extensions rather than globally sorted. The final partial
    /// batch is yielded even when smaller than the batch size. The
    /// iterator is finite and represents a single pass; call again for a
    /// fresh scan.
    pub fn scan_batches<P: AsRef<Path>>(&self, folder: P) -> Result<ScanBatches> {
        let folder = folder.as_ref();
        check_folder(folder)?;

        Ok(ScanBatches {
            scanner: self.clone(),
            folder: folder.to_path_buf(),
            extension_index: 0,
            walker: None,
            batch_size: SCAN_BATCH_SIZE,
        })
    }

    /// Whether a path is an eligible font file
    ///
    /// With `extension` set, matches that exact form; otherwise any
    /// recognized form.
    fn is_eligible(&self, path: &Path, extension: Option<&str>) -> bool {
        let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
            return false;
        };
        let extension_matches = match extension {
            Some(wanted) => ext == wanted,
            None => self.extensions.iter().any(|e| ext == e.as_str()),
        };
        if !extension_matches {
            return false;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }

        !is_cloud_syncing(path)
    }
}

impl Default for FontScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn check_folder(folder: &Path) -> Result<()> {
    if !folder.exists() {
        return Err(Error::NotFound {
            path: folder.to_path_buf(),
        });
    }
    if !folder.is_dir() {
        return Err(Error::NotADirectory {
            path: folder.to_path_buf(),
        });
    }
    Ok(())
}

/// Lazy batch iterator produced by [`FontScanner::scan_batches`]
pub struct ScanBatches {
    scanner: FontScanner,
    folder: PathBuf,
    extension_index: usize,
    walker: Option<walkdir::IntoIter>,
    batch_size: usize,
}

impl Iterator for ScanBatches {
    type Item = Vec<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::new();

        loop {
            let Some(walker) = self.walker.as_mut() else {
                // Advance to the next extension pass, or finish
                if self.extension_index >= self.scanner.extensions.len() {
                    break;
                }
                self.walker = Some(WalkDir::new(&self.folder).into_iter());
                continue;
            };

            match walker.next() {
                Some(Ok(entry)) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let extension = self.scanner.extensions[self.extension_index].clone();
                    let path = entry.into_path();
                    if self.scanner.is_eligible(&path, Some(&extension)) {
                        batch.push(path);
                        if batch.len() >= self.batch_size {
                            batch.sort();
                            return Some(batch);
                        }
                    }
                }
                Some(Err(_)) => continue, // unreadable entries are skipped
                None => {
                    self.walker = None;
                    self.extension_index += 1;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            batch.sort();
            Some(batch)
        }
    }
}

/// Build a [`FontFile`] record from the filesystem
pub async fn probe_font_file<P: AsRef<Path>>(path: P) -> Result<FontFile> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| Error::from_io(path, e))?;

    Ok(FontFile {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        size: metadata.len(),
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        locked: is_locked(path),
        cloud_syncing: is_cloud_syncing(path),
    })
}
