//! File lock detection and waiting

use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Interval between lock polls
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Check whether a file is currently lock-held by another process
///
/// A file counts as locked when opening it for read fails with a
/// permission/exclusivity-class error. A missing file is not locked.
pub fn is_locked<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if !path.exists() {
        return false;
    }

    match std::fs::File::open(path) {
        Ok(_) => false,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => true,
        #[cfg(unix)]
        Err(e) if e.raw_os_error() == Some(libc::EBUSY) => true,
        Err(_) => false,
    }
}

/// Poll until the file is no longer locked or the timeout elapses
///
/// Returns `true` once the lock clears, `false` on timeout.
pub async fn wait_for_unlock<P: AsRef<Path>>(path: P, timeout: Duration) -> bool {
    let path = path.as_ref();
    let start = Instant::now();

    while start.elapsed() < timeout {
        if !is_locked(path) {
            return true;
        }
        debug!("waiting for lock to clear: {}", path.display());
        sleep(LOCK_POLL_INTERVAL).await;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_not_locked() {
        assert!(!is_locked("/no/such/file.otf"));
    }

    #[test]
    fn test_readable_file_is_not_locked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("font.otf");
        std::fs::write(&path, b"OTTO").unwrap();
        assert!(!is_locked(&path));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_locked() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("font.otf");
        std::fs::write(&path, b"OTTO").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Mode 0o000 does not stop a privileged user from reading; only
        // assert when the permission bit actually bites.
        if std::fs::File::open(&path).is_err() {
            assert!(is_locked(&path));
        }

        // Restore so the temp dir can be cleaned up
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_unlocked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("font.otf");
        std::fs::write(&path, b"OTTO").unwrap();

        let start = std::time::Instant::now();
        assert!(wait_for_unlock(&path, Duration::from_secs(5)).await);
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_on_persistent_lock() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("font.otf");
        std::fs::write(&path, b"OTTO").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        if std::fs::File::open(&path).is_err() {
            let waited = wait_for_unlock(&path, Duration::from_secs(2)).await;
            assert!(!waited);
        }

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
    }
}
