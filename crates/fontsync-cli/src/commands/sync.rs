//! `fontsync sync` - the reconciliation run

use crate::display::{format_size_mb, print_error_list, Table};
use crate::json_output::{failure_summary, to_pretty_json};
use crate::progress::BarSink;
use console::style;
use fontsync_config::ManifestStore;
use fontsync_fs::check_disk_space;
use fontsync_sync::{SyncEngine, SyncPlan};
use fontsync_types::{Error, Result, SyncSettings};

/// Error entries shown before the "…and K more" trailer
const ERROR_DISPLAY_CAP: usize = 10;

/// Fonts above which a large-run notice is printed
const LARGE_RUN_THRESHOLD: usize = 500;

/// Run the sync command
pub async fn sync_command(settings: SyncSettings, json: bool, quiet: bool) -> Result<()> {
    match run(settings, json, quiet).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if json {
                // Keep stdout machine-readable even on aborted runs
                println!("{}", to_pretty_json(&failure_summary(&e)));
            }
            Err(e)
        }
    }
}

async fn run(settings: SyncSettings, json: bool, quiet: bool) -> Result<()> {
    let store = ManifestStore::new(&settings.manifest_path);
    if !store.exists() {
        return Err(Error::config(
            "no configuration found - run 'fontsync init' first",
        ));
    }

    let mut manifest = store.load().await?;
    let sync_folder = manifest.sync_folder_path()?;

    let announce = !json && !quiet;
    if announce {
        println!(
            "{} {}",
            style("Source folder:").bold(),
            style(sync_folder.display()).cyan()
        );
        println!();
    }

    let mut engine = SyncEngine::new(settings);

    let sink = BarSink::new(json || quiet);
    let plan = engine.plan(&manifest, Some(&sink)).await?;
    sink.finish();

    let scanned = plan.install.len()
        + plan.update.len()
        + plan.up_to_date.len()
        + plan.skipped.len()
        + plan.errors.len();

    if announce {
        if scanned == 0 {
            println!(
                "{}",
                style("No font files found in the source folder.").yellow()
            );
            return Ok(());
        }

        println!(
            "{} {} font files found.",
            style("ℹ").blue(),
            style(scanned).bold()
        );
        if scanned > LARGE_RUN_THRESHOLD {
            println!(
                "{}",
                style(format!(
                    "⚠ large run ({scanned} fonts) - this may take a while"
                ))
                .yellow()
            );
        }
        println!();

        for (path, reason) in &plan.skipped {
            println!(
                "{}",
                style(format!(
                    "warning: skipping {} ({reason})",
                    path.file_name().unwrap_or_default().to_string_lossy()
                ))
                .yellow()
            );
        }
    }

    if !plan.has_work() {
        if json {
            let summary = engine.execute(&plan, &mut manifest, &store, None).await?;
            println!("{}", to_pretty_json(&summary));
        } else if !quiet {
            println!("{} All fonts are up to date.", style("✓").green());
            println!(
                "{}",
                style(format!("installed: {}", plan.up_to_date.len())).dim()
            );
            print_error_list(&plan.errors, ERROR_DISPLAY_CAP);
        }
        return Ok(());
    }

    if announce {
        print_plan_table(&plan);
        println!();
        println!(
            "{}",
            style(format!(
                "Syncing {} fonts ({}).",
                plan.total_actions(),
                format_size_mb(plan.required_mb())
            ))
            .bold()
        );
    }

    let sink = BarSink::new(json || quiet);
    let summary = engine.execute(&plan, &mut manifest, &store, Some(&sink)).await?;
    sink.finish();

    if json {
        println!("{}", to_pretty_json(&summary));
        return Ok(());
    }

    if !quiet {
        println!();
        let applied = summary.added + summary.updated;
        if applied > 0 {
            println!(
                "{} {} fonts synchronized ({} new, {} updated).",
                style("✓").green(),
                applied,
                summary.added,
                summary.updated
            );
        }
        if !summary.errors.is_empty() {
            println!(
                "{} {} fonts failed.",
                style("✗").red(),
                summary.errors.len()
            );
        }
        print_error_list(&summary.errors, ERROR_DISPLAY_CAP);

        let space = check_disk_space(&engine.settings().install_dir, 0.0);
        if space.is_known() {
            println!();
            println!(
                "{}",
                style(format!(
                    "free disk space: {} ({:.1}% used)",
                    format_size_mb(space.free_mb),
                    space.used_percent
                ))
                .dim()
            );
        }
    }

    Ok(())
}

fn print_plan_table(plan: &SyncPlan) {
    let mut table = Table::new("Fonts to synchronize", &["Action", "Font", "Size"]);
    for candidate in &plan.install {
        table.add_row(vec![
            "install".to_string(),
            candidate.name.clone(),
            format_size_mb(candidate.size_mb),
        ]);
    }
    for candidate in &plan.update {
        table.add_row(vec![
            "update".to_string(),
            candidate.name.clone(),
            format_size_mb(candidate.size_mb),
        ]);
    }
    table.print();
}
