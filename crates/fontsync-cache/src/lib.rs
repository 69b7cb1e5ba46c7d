//! Fingerprint caching for fontsync
//!
//! Memoizes (path, size, mtime) → content hash and → descriptive metadata
//! in two independent persisted JSON documents sharing the same key
//! derivation and TTL policy. Hash lookups go through an in-process memo
//! first; a persisted hit promotes the entry into the memo.
//!
//! The cache is purely an optimization: persistence failures are
//! swallowed, corrupt documents are treated as empty, and callers degrade
//! to cold computation. Nothing here is ever a source of fatal error.

#![deny(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use fontsync_types::SyncSettings;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::{debug, info};

/// File name of the persisted hash store
pub const HASH_CACHE_FILE: &str = "hash_cache.json";

/// File name of the persisted info store
pub const INFO_CACHE_FILE: &str = "info_cache.json";

/// Persisted hash-store entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashEntry {
    /// Content hash of the file at caching time
    pub hash: String,
    /// Epoch seconds when the entry was created
    pub timestamp: u64,
    /// Original path, kept for inspection
    pub path: String,
}

/// Persisted info-store entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoEntry {
    /// Arbitrary descriptive metadata
    pub info: serde_json::Value,
    /// Epoch seconds when the entry was created
    pub timestamp: u64,
    /// Original path, kept for inspection
    pub path: String,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Entries in the persisted hash store
    pub hash_entries: usize,
    /// Entries in the persisted info store
    pub info_entries: usize,
    /// Entries in the in-process memo
    pub memory_entries: usize,
    /// Cache directory
    pub cache_dir: PathBuf,
    /// Configured TTL in hours
    pub ttl_hours: i64,
    /// On-disk size of the hash store in bytes
    pub hash_cache_size: u64,
    /// On-disk size of the info store in bytes
    pub info_cache_size: u64,
}

/// Two-tier fingerprint cache
#[derive(Debug)]
pub struct FontCache {
    cache_dir: PathBuf,
    ttl_hours: i64,
    hash_file: PathBuf,
    info_file: PathBuf,
    memo: HashMap<String, HashEntry>,
}

impl FontCache {
    /// Create a cache rooted at `cache_dir` with the given TTL in hours
    ///
    /// A TTL of zero or below means entries never expire.
    pub fn new<P: AsRef<Path>>(cache_dir: P, ttl_hours: i64) -> Self {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        Self {
            hash_file: cache_dir.join(HASH_CACHE_FILE),
            info_file: cache_dir.join(INFO_CACHE_FILE),
            cache_dir,
            ttl_hours,
            memo: HashMap::new(),
        }
    }

    /// Create a cache from injected settings
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(&settings.cache_dir, settings.cache_ttl_hours)
    }

    /// Derive the cache key for a path
    ///
    /// Keyed over (absolute path, size, mtime): any change to the file
    /// yields a new key and orphans the old entry until a sweep removes
    /// it. A file that cannot be stat'ed keys on the path alone.
    fn cache_key(path: &Path) -> String {
        let key_data = match std::fs::metadata(path) {
            Ok(metadata) => {
                let mtime = metadata
                    .modified()
                    .ok()
                    .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
                    .unwrap_or_default();
                format!(
                    "{}:{}:{}.{:09}",
                    path.display(),
                    metadata.len(),
                    mtime.as_secs(),
                    mtime.subsec_nanos()
                )
            }
            Err(_) => path.display().to_string(),
        };

        blake3::hash(key_data.as_bytes()).to_hex().to_string()
    }

    /// Whether an entry created at `timestamp` is still within the TTL
    fn is_entry_valid(&self, timestamp: u64) -> bool {
        if self.ttl_hours <= 0 {
            return true;
        }
        now_epoch_secs() < timestamp + self.ttl_hours as u64 * 3600
    }

    /// Look up a cached hash for a path
    pub async fn get_hash<P: AsRef<Path>>(&mut self, path: P) -> Option<String> {
        let path = path.as_ref();
        let key = Self::cache_key(path);

        if let Some(entry) = self.memo.get(&key) {
            if self.is_entry_valid(entry.timestamp) {
                debug!("cache hit (memo) for {}", path.display());
                return Some(entry.hash.clone());
            }
        }

        let store: HashMap<String, HashEntry> = load_store(&self.hash_file).await;
        if let Some(entry) = store.get(&key) {
            if self.is_entry_valid(entry.timestamp) {
                debug!("cache hit (disk) for {}", path.display());
                self.memo.insert(key, entry.clone());
                return Some(entry.hash.clone());
            }
        }

        debug!("cache miss for {}", path.display());
        None
    }

    /// Store a hash for a path
    pub async fn set_hash<P: AsRef<Path>>(&mut self, path: P, hash: &str) {
        let path = path.as_ref();
        let key = Self::cache_key(path);
        let entry = HashEntry {
            hash: hash.to_string(),
            timestamp: now_epoch_secs(),
            path: path.display().to_string(),
        };

        self.memo.insert(key.clone(), entry.clone());

        let mut store: HashMap<String, HashEntry> = load_store(&self.hash_file).await;
        store.insert(key, entry);
        save_store(&self.cache_dir, &self.hash_file, &store).await;
    }

    /// Look up cached metadata for a path
    pub async fn get_info<P: AsRef<Path>>(&self, path: P) -> Option<serde_json::Value> {
        let key = Self::cache_key(path.as_ref());

        let store: HashMap<String, InfoEntry> = load_store(&self.info_file).await;
        match store.get(&key) {
            Some(entry) if self.is_entry_valid(entry.timestamp) => Some(entry.info.clone()),
            _ => None,
        }
    }

    /// Store metadata for a path
    pub async fn set_info<P: AsRef<Path>>(&mut self, path: P, info: serde_json::Value) {
        let path = path.as_ref();
        let key = Self::cache_key(path);
        let entry = InfoEntry {
            info,
            timestamp: now_epoch_secs(),
            path: path.display().to_string(),
        };

        let mut store: HashMap<String, InfoEntry> = load_store(&self.info_file).await;
        store.insert(key, entry);
        save_store(&self.cache_dir, &self.info_file, &store).await;
    }

    /// Drop both tiers entirely
    pub async fn clear(&mut self) {
        self.memo.clear();
        let _ = fs::remove_file(&self.hash_file).await;
        let _ = fs::remove_file(&self.info_file).await;
        info!("cleared fingerprint cache");
    }

    /// Rewrite both stores keeping only valid entries
    ///
    /// Returns (hash entries removed, info entries removed). Expired
    /// entries are purged from the in-process memo as well.
    pub async fn sweep_expired(&mut self) -> (usize, usize) {
        let mut hash_store: HashMap<String, HashEntry> = load_store(&self.hash_file).await;
        let before = hash_store.len();
        hash_store.retain(|_, entry| self.is_entry_valid(entry.timestamp));
        let hash_removed = before - hash_store.len();
        if hash_removed > 0 {
            save_store(&self.cache_dir, &self.hash_file, &hash_store).await;
        }

        let mut info_store: HashMap<String, InfoEntry> = load_store(&self.info_file).await;
        let before = info_store.len();
        info_store.retain(|_, entry| self.is_entry_valid(entry.timestamp));
        let info_removed = before - info_store.len();
        if info_removed > 0 {
            save_store(&self.cache_dir, &self.info_file, &info_store).await;
        }

        let ttl_hours = self.ttl_hours;
        self.memo.retain(|_, entry| {
            ttl_hours <= 0 || now_epoch_secs() < entry.timestamp + ttl_hours as u64 * 3600
        });

        if hash_removed > 0 || info_removed > 0 {
            info!(
                "swept {} hash and {} info cache entries",
                hash_removed, info_removed
            );
        }
        (hash_removed, info_removed)
    }

    /// Current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let hash_store: HashMap<String, HashEntry> = load_store(&self.hash_file).await;
        let info_store: HashMap<String, InfoEntry> = load_store(&self.info_file).await;

        CacheStats {
            hash_entries: hash_store.len(),
            info_entries: info_store.len(),
            memory_entries: self.memo.len(),
            cache_dir: self.cache_dir.clone(),
            ttl_hours: self.ttl_hours,
            hash_cache_size: file_size(&self.hash_file).await,
            info_cache_size: file_size(&self.info_file).await,
        }
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Read a persisted store; missing or corrupt documents count as empty
async fn load_store<T: DeserializeOwned>(path: &Path) -> HashMap<String, T> {
    match fs::read_to_string(path).await {
        Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
        Err(_) => HashMap::new(),
    }
}

/// Write a persisted store, swallowing failures
async fn save_store<T: Serialize>(cache_dir: &Path, path: &Path, store: &HashMap<String, T>) {
    if let Err(e) = fs::create_dir_all(cache_dir).await {
        debug!("cache directory creation failed: {}", e);
        return;
    }
    match serde_json::to_string_pretty(store) {
        Ok(data) => {
            if let Err(e) = fs::write(path, data).await {
                debug!("cache write failed for {}: {}", path.display(), e);
            }
        }
        Err(e) => debug!("cache serialization failed: {}", e),
    }
}

async fn file_size(path: &Path) -> u64 {
    fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir, ttl_hours: i64) -> FontCache {
        FontCache::new(dir.path().join("cache"), ttl_hours)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO data").unwrap();

        let mut cache = cache_in(&dir, 24);
        assert_eq!(cache.get_hash(&font).await, None);

        cache.set_hash(&font, "abc123").await;
        assert_eq!(cache.get_hash(&font).await, Some("abc123".to_string()));
    }

    #[tokio::test]
    async fn test_persisted_hit_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO data").unwrap();

        {
            let mut cache = cache_in(&dir, 24);
            cache.set_hash(&font, "abc123").await;
        }

        let mut cache = cache_in(&dir, 24);
        assert_eq!(cache.get_hash(&font).await, Some("abc123".to_string()));
        // The disk hit was promoted into the memo
        assert_eq!(cache.stats().await.memory_entries, 1);
    }

    #[tokio::test]
    async fn test_content_change_invalidates_key() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO old").unwrap();

        let mut cache = cache_in(&dir, 24);
        cache.set_hash(&font, "oldhash").await;

        // Different size guarantees a different key even at equal mtime
        std::fs::write(&font, b"OTTO new and longer").unwrap();
        assert_eq!(cache.get_hash(&font).await, None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO data").unwrap();

        let mut cache = cache_in(&dir, 1);
        cache.set_hash(&font, "abc123").await;

        // Age the persisted entry past the 1-hour TTL
        let raw = std::fs::read_to_string(cache.hash_file.clone()).unwrap();
        let mut store: HashMap<String, HashEntry> = serde_json::from_str(&raw).unwrap();
        for entry in store.values_mut() {
            entry.timestamp -= 2 * 3600;
        }
        std::fs::write(
            cache.hash_file.clone(),
            serde_json::to_string(&store).unwrap(),
        )
        .unwrap();
        cache.memo.clear();

        assert_eq!(cache.get_hash(&font).await, None);
    }

    #[tokio::test]
    async fn test_non_positive_ttl_never_expires() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO data").unwrap();

        let mut cache = cache_in(&dir, 0);
        cache.set_hash(&font, "abc123").await;

        let raw = std::fs::read_to_string(cache.hash_file.clone()).unwrap();
        let mut store: HashMap<String, HashEntry> = serde_json::from_str(&raw).unwrap();
        for entry in store.values_mut() {
            entry.timestamp = 1; // ancient
        }
        std::fs::write(
            cache.hash_file.clone(),
            serde_json::to_string(&store).unwrap(),
        )
        .unwrap();
        cache.memo.clear();

        assert_eq!(cache.get_hash(&font).await, Some("abc123".to_string()));
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_and_reports_counts() {
        let dir = TempDir::new().unwrap();
        let fresh = dir.path().join("fresh.otf");
        let stale = dir.path().join("stale.otf");
        std::fs::write(&fresh, b"OTTO fresh").unwrap();
        std::fs::write(&stale, b"OTTO stale").unwrap();

        let mut cache = cache_in(&dir, 1);
        cache.set_hash(&fresh, "freshhash").await;
        cache.set_hash(&stale, "stalehash").await;
        cache.set_info(&stale, serde_json::json!({"size_mb": 1.5})).await;

        // Age only the stale entries
        let raw = std::fs::read_to_string(cache.hash_file.clone()).unwrap();
        let mut store: HashMap<String, HashEntry> = serde_json::from_str(&raw).unwrap();
        for entry in store.values_mut() {
            if entry.hash == "stalehash" {
                entry.timestamp -= 2 * 3600;
            }
        }
        std::fs::write(
            cache.hash_file.clone(),
            serde_json::to_string(&store).unwrap(),
        )
        .unwrap();

        let info_raw = std::fs::read_to_string(cache.info_file.clone()).unwrap();
        let mut info_store: HashMap<String, InfoEntry> = serde_json::from_str(&info_raw).unwrap();
        for entry in info_store.values_mut() {
            entry.timestamp -= 2 * 3600;
        }
        std::fs::write(
            cache.info_file.clone(),
            serde_json::to_string(&info_store).unwrap(),
        )
        .unwrap();

        let (hash_removed, info_removed) = cache.sweep_expired().await;
        assert_eq!(hash_removed, 1);
        assert_eq!(info_removed, 1);

        let stats = cache.stats().await;
        assert_eq!(stats.hash_entries, 1);
        assert_eq!(stats.info_entries, 0);
    }

    #[tokio::test]
    async fn test_corrupt_store_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO data").unwrap();

        let mut cache = cache_in(&dir, 24);
        std::fs::create_dir_all(&cache.cache_dir).unwrap();
        std::fs::write(&cache.hash_file, "{broken json").unwrap();

        assert_eq!(cache.get_hash(&font).await, None);
        // Writing through the corruption works
        cache.set_hash(&font, "abc123").await;
        assert_eq!(cache.get_hash(&font).await, Some("abc123".to_string()));
    }

    #[tokio::test]
    async fn test_clear_drops_both_tiers() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO data").unwrap();

        let mut cache = cache_in(&dir, 24);
        cache.set_hash(&font, "abc123").await;
        cache.set_info(&font, serde_json::json!({"ok": true})).await;

        cache.clear().await;

        let stats = cache.stats().await;
        assert_eq!(stats.hash_entries, 0);
        assert_eq!(stats.info_entries, 0);
        assert_eq!(stats.memory_entries, 0);
    }

    #[tokio::test]
    async fn test_info_round_trip() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("A.otf");
        std::fs::write(&font, b"OTTO data").unwrap();

        let mut cache = cache_in(&dir, 24);
        cache
            .set_info(&font, serde_json::json!({"size_mb": 2.5, "name": "A.otf"}))
            .await;

        let info = cache.get_info(&font).await.unwrap();
        assert_eq!(info["name"], "A.otf");
    }

    #[test]
    fn test_cache_key_is_fixed_length_hex() {
        let key = FontCache::cache_key(Path::new("/does/not/exist.otf"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
