//! Shared fixtures for the fontsync integration tests

use fontsync_types::SyncSettings;
use std::path::Path;

/// Settings rooted inside a test directory
pub fn test_settings(root: &Path) -> SyncSettings {
    SyncSettings {
        manifest_path: root.join("state").join("config.json"),
        cache_dir: root.join("state").join("cache"),
        install_dir: root.join("installed"),
        cache_ttl_hours: 24,
    }
}

/// Create a font file with the given content, creating parent directories
pub fn write_font(folder: &Path, name: &str, content: &[u8]) {
    let path = folder.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
