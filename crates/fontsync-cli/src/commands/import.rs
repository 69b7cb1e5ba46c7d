//! `fontsync import` - bring fonts into the source folder

use crate::display::print_error_list;
use crate::expand_tilde;
use console::style;
use dialoguer::{Confirm, Input};
use fontsync_config::ManifestStore;
use fontsync_fs::{validate_font, Fingerprinter, FontScanner};
use fontsync_types::{Error, Result, SyncSettings};
use std::path::{Path, PathBuf};
use tokio::fs;

const ERROR_DISPLAY_CAP: usize = 5;
const PREVIEW_CAP: usize = 10;

/// Run the import command
pub async fn import_command(
    settings: SyncSettings,
    path: Option<String>,
    move_files: bool,
) -> Result<()> {
    let store = ManifestStore::new(&settings.manifest_path);
    if !store.exists() {
        return Err(Error::config(
            "no configuration found - run 'fontsync init' first",
        ));
    }

    let manifest = store.load().await?;
    let sync_folder = manifest.sync_folder_path()?;

    let input = match path {
        Some(path) => path,
        None => {
            println!("{}", style("Font import").bold());
            println!("Enter a font file or a directory of fonts to import.");
            Input::new()
                .with_prompt("Path")
                .interact_text()
                .map_err(|e| Error::io(format!("prompt failed: {e}")))?
        }
    };

    let import_path = expand_tilde(input.trim());
    if !import_path.exists() {
        return Err(Error::NotFound { path: import_path });
    }

    let fonts = collect_fonts(&import_path).await?;
    if fonts.is_empty() {
        println!(
            "{}",
            style("No font files found at the given path.").yellow()
        );
        return Ok(());
    }

    println!();
    println!("{} {} fonts found:", style("ℹ").blue(), fonts.len());
    for font in fonts.iter().take(PREVIEW_CAP) {
        println!(
            "  • {}",
            font.file_name().unwrap_or_default().to_string_lossy()
        );
    }
    if fonts.len() > PREVIEW_CAP {
        println!("  ...and {} more", fonts.len() - PREVIEW_CAP);
    }

    let operation = if move_files { "move" } else { "copy" };
    println!();
    println!(
        "Fonts will be {}d into {}",
        operation,
        style(sync_folder.display()).cyan()
    );

    let proceed = Confirm::new()
        .with_prompt(format!("Proceed with the {operation}?"))
        .default(true)
        .interact()
        .map_err(|e| Error::io(format!("prompt failed: {e}")))?;
    if !proceed {
        println!("{}", style("Import cancelled.").yellow());
        return Ok(());
    }

    let fingerprinter = Fingerprinter::default();
    let mut imported = 0usize;
    let mut skipped = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for src in &fonts {
        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut dest = sync_folder.join(&name);

        if dest.exists() {
            // Identical content is a duplicate, not a collision
            let identical = matches!(
                (
                    fingerprinter.fingerprint(src).await,
                    fingerprinter.fingerprint(&dest).await,
                ),
                (Ok(a), Ok(b)) if a == b
            );
            if identical {
                skipped += 1;
                continue;
            }
            dest = numbered_destination(&sync_folder, src);
        }

        match transfer(src, &dest, move_files).await {
            Ok(()) => imported += 1,
            Err(e) => errors.push(format!("{name}: {e}")),
        }
    }

    println!();
    if imported > 0 {
        println!(
            "{} {} fonts {}d.",
            style("✓").green(),
            imported,
            operation
        );
    }
    if skipped > 0 {
        println!(
            "{} {} fonts already present, skipped.",
            style("ℹ").blue(),
            skipped
        );
    }
    if !errors.is_empty() {
        println!("{} {} fonts failed.", style("✗").red(), errors.len());
    }
    print_error_list(&errors, ERROR_DISPLAY_CAP);

    if imported > 0 {
        println!();
        println!(
            "{}",
            style("hint: run 'fontsync sync' to install the new fonts").dim()
        );
    }

    Ok(())
}

/// Gather fonts from a single file or a directory tree
async fn collect_fonts(import_path: &Path) -> Result<Vec<PathBuf>> {
    if import_path.is_file() {
        validate_font(import_path).await?;
        return Ok(vec![import_path.to_path_buf()]);
    }

    FontScanner::new().scan(import_path)
}

/// Find a free `stem_N.ext` destination next to an existing name
fn numbered_destination(folder: &Path, src: &Path) -> PathBuf {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = src
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = folder.join(format!("{stem}_{counter}.{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Copy (or move) preserving the modification time
async fn transfer(src: &Path, dest: &Path, move_files: bool) -> Result<()> {
    if move_files {
        // Same-volume moves are a rename; fall through to copy+delete
        if fs::rename(src, dest).await.is_ok() {
            return Ok(());
        }
    }

    fs::copy(src, dest)
        .await
        .map_err(|e| Error::io(format!("failed to copy to '{}': {}", dest.display(), e)))?;

    if let Ok(metadata) = fs::metadata(src).await {
        if let Ok(modified) = metadata.modified() {
            let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified));
        }
    }

    if move_files {
        fs::remove_file(src)
            .await
            .map_err(|e| Error::from_io(src, e))?;
    }

    Ok(())
}
