//! Safe font installation and removal
//!
//! The copy protocol never leaves a partially written destination behind:
//! bytes land in a sibling temp file that is renamed into place only after
//! the copy (and timestamp preservation) succeeded.

use crate::locks::{is_locked, wait_for_unlock};
use crate::name::safe_file_name;
use crate::space::check_disk_space;
use crate::validate::validate_font;
use fontsync_types::{Error, Result, RetryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How long to wait for a locked source before a copy fails
pub const COPY_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for a locked installed font before a removal fails
pub const REMOVE_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Safety factor applied to the source size when checking destination space
pub const DISK_SPACE_MARGIN: f64 = 1.1;

/// Installs fonts into (and removes them from) the per-machine directory
#[derive(Debug, Clone)]
pub struct FontInstaller {
    install_dir: PathBuf,
    retry: RetryConfig,
}

impl FontInstaller {
    /// Create an installer targeting the given directory
    pub fn new<P: AsRef<Path>>(install_dir: P) -> Self {
        Self {
            install_dir: install_dir.as_ref().to_path_buf(),
            retry: RetryConfig::for_remove(),
        }
    }

    /// The directory fonts are installed into
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Copy a font into the install directory (or `dest_dir` override)
    ///
    /// With `validate` set, the font is validated first, a locked source is
    /// waited out (failing `FileLocked` on timeout), and the destination
    /// name is sanitized. Without it the raw filename is trusted; only
    /// internal re-copy paths do that.
    ///
    /// Returns the destination path on success.
    pub async fn copy<P: AsRef<Path>>(
        &self,
        src: P,
        dest_dir: Option<&Path>,
        validate: bool,
    ) -> Result<PathBuf> {
        let src = src.as_ref();
        if !src.exists() {
            return Err(Error::NotFound {
                path: src.to_path_buf(),
            });
        }

        let raw_name = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let file_name = if validate {
            let report = validate_font(src).await?;
            for warning in &report.warnings {
                debug!("{}: {}", src.display(), warning);
            }

            if report.locked && !wait_for_unlock(src, COPY_LOCK_TIMEOUT).await {
                return Err(Error::locked(
                    src,
                    Some("close the application using the font"),
                ));
            }

            safe_file_name(&raw_name)
        } else {
            raw_name
        };

        let dest_dir = dest_dir.unwrap_or(&self.install_dir);
        let dest = dest_dir.join(&file_name);

        let size_mb = fs::metadata(src)
            .await
            .map_err(|e| Error::from_io(src, e))?
            .len() as f64
            / (1024.0 * 1024.0);
        let required_mb = size_mb * DISK_SPACE_MARGIN;
        let space = check_disk_space(dest_dir, required_mb);
        if !space.sufficient {
            return Err(Error::DiskSpace {
                required_mb,
                free_mb: space.free_mb,
            });
        }

        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| Error::from_io(dest_dir, e))?;

        self.copy_atomic(src, dest_dir, &file_name, &dest).await?;

        debug!("installed {} -> {}", src.display(), dest.display());
        Ok(dest)
    }

    /// Copy bytes and timestamps through a temp file, then rename into
    /// place
    async fn copy_atomic(
        &self,
        src: &Path,
        dest_dir: &Path,
        file_name: &str,
        dest: &Path,
    ) -> Result<()> {
        let staging = dest_dir.join(format!(".{file_name}.partial"));

        let copied = fs::copy(src, &staging).await;
        if let Err(e) = copied {
            let _ = fs::remove_file(&staging).await;
            return Err(match e.kind() {
                std::io::ErrorKind::PermissionDenied => Error::permission(
                    dest,
                    Some("run with elevated privileges or check permissions on the install directory"),
                ),
                _ => Error::io(format!(
                    "failed to copy '{}' to '{}': {}",
                    src.display(),
                    dest.display(),
                    e
                )),
            });
        }

        // Preserve the source modification time on the destination
        if let Ok(metadata) = fs::metadata(src).await {
            if let Ok(modified) = metadata.modified() {
                let _ = filetime::set_file_mtime(
                    &staging,
                    filetime::FileTime::from_system_time(modified),
                );
            }
        }

        if let Err(e) = fs::rename(&staging, dest).await {
            let _ = fs::remove_file(&staging).await;
            return Err(Error::from_io(dest, e));
        }

        Ok(())
    }

    /// Resolve the installed path for a font name
    ///
    /// Tries the sanitized name first, then the raw name for entries
    /// installed before sanitization existed.
    pub fn installed_path(&self, name: &str) -> Option<PathBuf> {
        let sanitized = self.install_dir.join(safe_file_name(name));
        if sanitized.exists() {
            return Some(sanitized);
        }

        let raw = self.install_dir.join(name);
        if raw.exists() {
            return Some(raw);
        }

        None
    }

    /// Whether a font name is present in the install directory
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed_path(name).is_some()
    }

    /// Remove an installed font
    ///
    /// Returns `Ok(false)` when the font is not installed. A locked file is
    /// waited out; deletion is retried on transient failures per the
    /// removal policy.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let Some(path) = self.installed_path(name) else {
            return Ok(false);
        };

        if is_locked(&path) && !wait_for_unlock(&path, REMOVE_LOCK_TIMEOUT).await {
            return Err(Error::locked(
                &path,
                Some("close the application using the font"),
            ));
        }

        let mut attempt = 0;
        loop {
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("removed {}", path.display());
                    return Ok(true);
                }
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                    return Err(Error::permission(
                        &path,
                        Some("run with elevated privileges or check file permissions"),
                    ));
                }
                Err(e) => {
                    let error = Error::from_io(&path, e);
                    if error.is_transient() && attempt < self.retry.max_retries {
                        let delay = self.retry.delay_for_attempt(attempt);
                        warn!(
                            "removal attempt {} failed for {} ({}), retrying in {:?}",
                            attempt + 1,
                            path.display(),
                            error,
                            delay
                        );
                        sleep(delay).await;
                        attempt += 1;
                    } else {
                        return Err(error);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontsync_types::ErrorKind;
    use tempfile::TempDir;

    fn installer(dir: &TempDir) -> FontInstaller {
        FontInstaller::new(dir.path().join("fonts"))
    }

    #[tokio::test]
    async fn test_copy_installs_font() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("Source.otf");
        std::fs::write(&src, b"OTTO some bytes").unwrap();

        let installer = installer(&dir);
        let dest = installer.copy(&src, None, true).await.unwrap();

        assert_eq!(dest, installer.install_dir().join("Source.otf"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"OTTO some bytes");
    }

    #[tokio::test]
    async fn test_copy_preserves_mtime() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("Source.otf");
        std::fs::write(&src, b"OTTO bytes").unwrap();
        let past = filetime::FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&src, past).unwrap();

        let dest = installer(&dir).copy(&src, None, true).await.unwrap();

        let dest_mtime = filetime::FileTime::from_last_modification_time(
            &std::fs::metadata(&dest).unwrap(),
        );
        assert_eq!(dest_mtime.unix_seconds(), 1_500_000_000);
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = installer(&dir)
            .copy(dir.path().join("gone.otf"), None, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_copy_rejects_invalid_font_when_validating() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("empty.otf");
        std::fs::write(&src, b"").unwrap();

        let err = installer(&dir).copy(&src, None, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FontValidation);
    }

    #[tokio::test]
    async fn test_copy_without_validation_trusts_name() {
        let dir = TempDir::new().unwrap();
        // Would fail extension validation, but validation is off
        let src = dir.path().join("notafont.bin");
        std::fs::write(&src, b"data").unwrap();

        let dest = installer(&dir).copy(&src, None, false).await.unwrap();
        assert!(dest.ends_with("notafont.bin"));
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_copy_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("Font.otf");
        std::fs::write(&src, b"OTTO bytes").unwrap();

        let installer = installer(&dir);
        installer.copy(&src, None, true).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(installer.install_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["Font.otf".to_string()]);
    }

    #[tokio::test]
    async fn test_copy_to_override_directory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("Font.otf");
        std::fs::write(&src, b"OTTO bytes").unwrap();
        let override_dir = dir.path().join("elsewhere");

        let dest = installer(&dir)
            .copy(&src, Some(&override_dir), true)
            .await
            .unwrap();
        assert_eq!(dest, override_dir.join("Font.otf"));
    }

    #[tokio::test]
    async fn test_installed_path_falls_back_to_raw_name() {
        let dir = TempDir::new().unwrap();
        let installer = installer(&dir);
        std::fs::create_dir_all(installer.install_dir()).unwrap();

        // A pre-sanitization install kept the raw (trailing-dot) name
        let raw = installer.install_dir().join("Legacy.otf.");
        std::fs::write(&raw, b"OTTO").unwrap();

        assert_eq!(installer.installed_path("Legacy.otf."), Some(raw));
    }

    #[tokio::test]
    async fn test_remove_absent_font_is_false_not_error() {
        let dir = TempDir::new().unwrap();
        assert!(!installer(&dir).remove("Nope.otf").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_installed_font() {
        let dir = TempDir::new().unwrap();
        let installer = installer(&dir);
        std::fs::create_dir_all(installer.install_dir()).unwrap();
        std::fs::write(installer.install_dir().join("Gone.otf"), b"OTTO").unwrap();

        assert!(installer.remove("Gone.otf").await.unwrap());
        assert!(!installer.is_installed("Gone.otf"));
    }
}
