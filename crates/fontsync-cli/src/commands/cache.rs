//! `fontsync cache` - fingerprint-cache maintenance

use clap::Subcommand;
use console::style;
use fontsync_cache::FontCache;
use fontsync_types::{Result, SyncSettings};

/// Cache maintenance operations
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CacheAction {
    /// Show entry counts and on-disk sizes
    Stats,
    /// Drop both cache stores entirely
    Clear,
    /// Remove expired entries and report how many went
    Sweep,
}

/// Run the cache command
pub async fn cache_command(settings: &SyncSettings, action: CacheAction) -> Result<()> {
    let mut cache = FontCache::from_settings(settings);

    match action {
        CacheAction::Stats => {
            let stats = cache.stats().await;
            println!("{}", style("Fingerprint cache").bold().underlined());
            println!("  Directory: {}", style(stats.cache_dir.display()).cyan());
            println!(
                "  TTL: {}",
                if stats.ttl_hours <= 0 {
                    "never expires".to_string()
                } else {
                    format!("{} hours", stats.ttl_hours)
                }
            );
            println!(
                "  Hash entries: {} ({} bytes on disk)",
                style(stats.hash_entries).green(),
                stats.hash_cache_size
            );
            println!(
                "  Info entries: {} ({} bytes on disk)",
                style(stats.info_entries).green(),
                stats.info_cache_size
            );
            println!("  In-memory entries: {}", stats.memory_entries);
        }
        CacheAction::Clear => {
            cache.clear().await;
            println!("{} Cache cleared.", style("✓").green());
        }
        CacheAction::Sweep => {
            let (hash_removed, info_removed) = cache.sweep_expired().await;
            println!(
                "{} Removed {} expired hash entries and {} expired info entries.",
                style("✓").green(),
                hash_removed,
                info_removed
            );
        }
    }

    Ok(())
}
