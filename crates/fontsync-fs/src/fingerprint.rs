//! Content fingerprinting
//!
//! Streams a file through SHA-256 in fixed-size chunks so memory stays
//! bounded regardless of file size. Lock contention is waited out with
//! bounded polling; transient I/O failures are retried with exponential
//! backoff.

use crate::locks::{is_locked, wait_for_unlock};
use fontsync_types::{Error, Result, RetryConfig};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Read chunk size for fingerprinting
pub const FINGERPRINT_CHUNK_SIZE: usize = 8 * 1024;

/// Default time to wait for a locked file before giving up
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Computes content fingerprints with lock waiting and retry
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    retry: RetryConfig,
    lock_timeout: Duration,
}

impl Fingerprinter {
    /// Create a fingerprinter with an explicit retry policy and lock wait
    pub fn new(retry: RetryConfig, lock_timeout: Duration) -> Self {
        Self {
            retry,
            lock_timeout,
        }
    }

    /// Compute the SHA-256 hex fingerprint of a file
    ///
    /// Fails with `NotFound` when the path does not exist and `FileLocked`
    /// when the file stays lock-held past the timeout. Transient failures
    /// are retried per the configured policy; `NotFound` and validation
    /// failures are not.
    pub async fn fingerprint<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let mut attempt = 0;

        loop {
            match self.fingerprint_once(path).await {
                Ok(hash) => return Ok(hash),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        "fingerprint attempt {} failed for {} ({}), retrying in {:?}",
                        attempt + 1,
                        path.display(),
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fingerprint_once(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }

        if is_locked(path) && !wait_for_unlock(path, self.lock_timeout).await {
            return Err(Error::locked(
                path,
                Some("another application may be using the file"),
            ));
        }

        let mut file = fs::File::open(path)
            .await
            .map_err(|e| Error::from_io(path, e))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; FINGERPRINT_CHUNK_SIZE];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| Error::from_io(path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        let digest = hasher.finalize();
        let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        debug!("fingerprinted {}: {}", path.display(), &hash[..12]);
        Ok(hash)
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(RetryConfig::for_fingerprint(), DEFAULT_LOCK_TIMEOUT)
    }
}
