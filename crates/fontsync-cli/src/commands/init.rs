//! `fontsync init` - create the manifest and choose the source folder

use crate::expand_tilde;
use console::style;
use dialoguer::{Confirm, Input};
use fontsync_config::ManifestStore;
use fontsync_fs::FontScanner;
use fontsync_types::{Error, Result, SyncSettings};

const DEFAULT_FOLDER_SUGGESTION: &str = "~/Dropbox/shared-fonts/";

/// Run the init command
pub async fn init_command(
    settings: &SyncSettings,
    folder: Option<String>,
    force: bool,
) -> Result<()> {
    let store = ManifestStore::new(&settings.manifest_path);

    if store.exists() && !force {
        println!("{}", style("A manifest already exists.").yellow());
        if let Ok(manifest) = store.load().await {
            println!(
                "Current source folder: {}",
                style(&manifest.sync_folder).cyan()
            );
        }

        let overwrite = Confirm::new()
            .with_prompt("Overwrite the existing configuration?")
            .default(false)
            .interact()
            .map_err(|e| Error::io(format!("prompt failed: {e}")))?;
        if !overwrite {
            println!("{}", style("Init cancelled.").yellow());
            return Ok(());
        }
    }

    let folder = match folder {
        Some(folder) => folder,
        None => {
            println!("{}", style("fontsync initial setup").bold());
            println!("Enter the source folder to synchronize fonts from.");
            Input::new()
                .with_prompt("Source folder")
                .default(DEFAULT_FOLDER_SUGGESTION.to_string())
                .interact_text()
                .map_err(|e| Error::io(format!("prompt failed: {e}")))?
        }
    };

    let folder = expand_tilde(folder.trim());

    if !folder.exists() {
        println!(
            "{}",
            style(format!("The folder does not exist: {}", folder.display())).yellow()
        );
        let create = Confirm::new()
            .with_prompt("Create it?")
            .default(true)
            .interact()
            .map_err(|e| Error::io(format!("prompt failed: {e}")))?;
        if !create {
            return Err(Error::config("a valid source folder is required"));
        }
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| Error::from_io(&folder, e))?;
        println!("{} created {}", style("✓").green(), folder.display());
    }

    if !folder.is_dir() {
        return Err(Error::NotADirectory { path: folder });
    }

    store.create(folder.to_string_lossy().to_string()).await?;

    println!();
    println!("{} Configuration saved.", style("✓").green());
    println!("  Manifest: {}", style(store.path().display()).cyan());
    println!("  Source folder: {}", style(folder.display()).cyan());

    match FontScanner::new().scan(&folder) {
        Ok(fonts) if !fonts.is_empty() => {
            println!();
            println!(
                "{} {} font files found.",
                style("ℹ").blue(),
                style(fonts.len()).bold()
            );
            println!("Run {} to install them.", style("fontsync sync").bold());
        }
        _ => {
            println!();
            println!(
                "{}",
                style("No font files found in the source folder yet.").yellow()
            );
            println!("Place .otf or .ttf files there, then run fontsync sync.");
        }
    }

    Ok(())
}
