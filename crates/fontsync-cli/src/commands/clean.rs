//! `fontsync clean` - remove fonts whose source files are gone

use crate::display::{print_error_list, Table};
use crate::progress::BarSink;
use console::style;
use dialoguer::Confirm;
use fontsync_config::ManifestStore;
use fontsync_fs::FontScanner;
use fontsync_sync::SyncEngine;
use fontsync_types::{Error, Result, SyncSettings};
use std::collections::HashSet;

const ERROR_DISPLAY_CAP: usize = 5;

/// Run the clean command
pub async fn clean_command(settings: SyncSettings, execute: bool) -> Result<()> {
    let store = ManifestStore::new(&settings.manifest_path);
    if !store.exists() {
        return Err(Error::config(
            "no configuration found - run 'fontsync init' first",
        ));
    }

    let mut manifest = store.load().await?;
    let sync_folder = manifest.sync_folder_path()?;

    println!(
        "{} {}",
        style("Source folder:").bold(),
        style(sync_folder.display()).cyan()
    );
    println!();

    if manifest.installed_fonts.is_empty() {
        println!("{} Nothing to clean up.", style("✓").green());
        return Ok(());
    }

    let source_names: HashSet<String> = FontScanner::new()
        .scan(&sync_folder)?
        .into_iter()
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();

    let engine = SyncEngine::new(settings);
    let candidates = engine.plan_cleanup(&manifest, &source_names);

    if candidates.is_empty() {
        println!("{} Nothing to clean up.", style("✓").green());
        return Ok(());
    }

    let mut table = Table::new(
        format!("Fonts to remove ({})", candidates.len()),
        &["Font", "Reason", "Installed"],
    );
    for candidate in &candidates {
        table.add_row(vec![
            candidate.name.clone(),
            candidate.reason.to_string(),
            candidate.installed_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    table.print();

    if !execute {
        println!();
        println!(
            "{}",
            style("Dry run - nothing was removed.").yellow()
        );
        println!(
            "{}",
            style("Pass --execute to remove these fonts.").dim()
        );
        return Ok(());
    }

    println!();
    let confirmed = Confirm::new()
        .with_prompt(format!("Remove {} fonts?", candidates.len()))
        .default(false)
        .interact()
        .map_err(|e| Error::io(format!("prompt failed: {e}")))?;
    if !confirmed {
        println!("{}", style("Clean cancelled.").yellow());
        return Ok(());
    }

    let sink = BarSink::new(false);
    let summary = engine
        .execute_cleanup(&candidates, &mut manifest, &store, false, Some(&sink))
        .await?;
    sink.finish();

    println!();
    if summary.removed > 0 {
        println!("{} {} fonts removed.", style("✓").green(), summary.removed);
    }
    if !summary.errors.is_empty() {
        println!(
            "{} {} fonts could not be removed.",
            style("✗").red(),
            summary.errors.len()
        );
    }
    print_error_list(&summary.errors, ERROR_DISPLAY_CAP);

    Ok(())
}
