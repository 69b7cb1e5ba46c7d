//! `fontsync list` - show source fonts and their install state

use crate::display::{format_size_mb, Table};
use crate::json_output::{to_pretty_json, FontListing, ListDocument};
use chrono::{DateTime, Utc};
use console::style;
use fontsync_config::ManifestStore;
use fontsync_fs::{probe_font_file, FontScanner};
use fontsync_sync::SyncEngine;
use fontsync_types::{Error, Result, SyncSettings};

/// Install-state filter for the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusFilter {
    /// Every font in the source folder
    All,
    /// Only fonts recorded in the manifest
    Installed,
    /// Only fonts not yet installed
    NotInstalled,
}

/// Output format for the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-oriented table
    Table,
    /// Machine-readable JSON document
    Json,
}

/// Run the list command
pub async fn list_command(
    settings: SyncSettings,
    status: StatusFilter,
    format: OutputFormat,
) -> Result<()> {
    let store = ManifestStore::new(&settings.manifest_path);
    if !store.exists() {
        return Err(Error::config(
            "no configuration found - run 'fontsync init' first",
        ));
    }

    let manifest = store.load().await?;
    let sync_folder = manifest.sync_folder_path()?;

    let fonts = FontScanner::new().scan(&sync_folder)?;
    if fonts.is_empty() {
        println!(
            "{}",
            style("No font files found in the source folder.").yellow()
        );
        return Ok(());
    }

    let mut engine = SyncEngine::new(settings);
    let mut listings = Vec::with_capacity(fonts.len());

    for path in fonts {
        let Ok(file) = probe_font_file(&path).await else {
            continue; // vanished between scan and probe
        };

        let entry = manifest.entry(&file.name);
        let needs_update = match entry {
            Some(entry) => engine
                .fingerprint_cached(&path)
                .await
                .map(|hash| hash != entry.hash)
                .unwrap_or(false),
            None => false,
        };

        listings.push(FontListing {
            name: file.name.clone(),
            path: path.display().to_string(),
            size_mb: (file.size_mb() * 100.0).round() / 100.0,
            modified: DateTime::<Utc>::from(file.modified),
            is_installed: entry.is_some(),
            needs_update,
            installed_at: entry.map(|e| e.installed_at),
        });
    }

    listings.retain(|listing| match status {
        StatusFilter::All => true,
        StatusFilter::Installed => listing.is_installed,
        StatusFilter::NotInstalled => !listing.is_installed,
    });
    listings.sort_by_key(|listing| listing.name.to_lowercase());

    match format {
        OutputFormat::Json => {
            let document = ListDocument {
                sync_folder: sync_folder.display().to_string(),
                total_fonts: listings.len(),
                fonts: listings,
            };
            println!("{}", to_pretty_json(&document));
        }
        OutputFormat::Table => print_listing_table(&sync_folder.display().to_string(), &listings),
    }

    Ok(())
}

fn print_listing_table(sync_folder: &str, listings: &[FontListing]) {
    let mut table = Table::new(
        format!("Fonts - {sync_folder}"),
        &["St", "Font", "Size", "Modified", "Notes"],
    );

    for listing in listings {
        let status = if listing.is_installed {
            if listing.needs_update {
                "!"
            } else {
                "✓"
            }
        } else {
            "✗"
        };

        let mut notes = Vec::new();
        if listing.needs_update {
            notes.push("needs update".to_string());
        }
        if let Some(installed_at) = listing.installed_at {
            notes.push(format!("installed {}", installed_at.format("%Y-%m-%d")));
        }

        table.add_row(vec![
            status.to_string(),
            listing.name.clone(),
            format_size_mb(listing.size_mb),
            listing.modified.format("%Y-%m-%d %H:%M").to_string(),
            if notes.is_empty() {
                "-".to_string()
            } else {
                notes.join(", ")
            },
        ]);
    }

    table.print();

    let total = listings.len();
    let installed = listings.iter().filter(|l| l.is_installed).count();
    let needs_update = listings.iter().filter(|l| l.needs_update).count();

    println!();
    println!("{} {} fonts", style("Total:").bold(), total);
    println!("  {} installed: {}", style("✓").green(), installed);
    if needs_update > 0 {
        println!("  {} needs update: {}", style("!").yellow(), needs_update);
    }
    println!("  {} not installed: {}", style("✗").red(), total - installed);

    if total - installed > 0 || needs_update > 0 {
        println!();
        println!(
            "{}",
            style("hint: run 'fontsync sync' to install them").dim()
        );
    }
}
