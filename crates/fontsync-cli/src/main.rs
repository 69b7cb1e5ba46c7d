//! fontsync - keep a machine's fonts in step with a shared folder
//!
//! Scans a shared source folder (Dropbox, iCloud Drive, a file server),
//! fingerprints every font, and installs new or changed files into the
//! per-machine font directory, tracking state in a local manifest.

use clap::{Parser, Subcommand};
use console::style;
use fontsync_types::{Error, Result, SyncSettings};
use std::path::PathBuf;
use tracing::info;

mod commands;
mod display;
mod json_output;
mod progress;

/// fontsync - CLI font synchronization over a shared folder
#[derive(Parser)]
#[command(
    name = "fontsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Synchronize fonts from a shared folder into the local font directory",
    long_about = "fontsync scans a shared source folder for .otf/.ttf files,\n\
                  fingerprints their content, and installs new or changed fonts\n\
                  into the per-machine font directory. Installation state is\n\
                  tracked in a local manifest so repeated runs only do new work."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the font install directory
    #[arg(long, global = true, value_name = "DIR")]
    install_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the manifest and choose the source folder
    Init {
        /// Source folder to synchronize from
        #[arg(short, long)]
        folder: Option<String>,
        /// Overwrite an existing manifest without asking
        #[arg(long)]
        force: bool,
    },
    /// Install new and changed fonts from the source folder
    Sync {
        /// Emit a machine-readable JSON summary instead of tables
        #[arg(long)]
        json: bool,
    },
    /// List fonts in the source folder with their install state
    List {
        /// Filter by install state
        #[arg(short, long, value_enum, default_value = "all")]
        status: commands::list::StatusFilter,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: commands::list::OutputFormat,
    },
    /// Copy fonts into the source folder
    Import {
        /// Font file or directory to import
        path: Option<String>,
        /// Move instead of copy
        #[arg(short, long)]
        r#move: bool,
    },
    /// Remove fonts whose source files are gone
    Clean {
        /// Actually delete; the default only reports what would go
        #[arg(long, conflicts_with = "dry_run")]
        execute: bool,
        /// Report without deleting (default)
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect or maintain the fingerprint cache
    Cache {
        #[command(subcommand)]
        action: commands::cache::CacheAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.quiet, cli.verbose);

    info!("fontsync v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = match resolve_settings(cli.install_dir.clone()) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&e),
    };

    let outcome = match cli.command {
        Commands::Init { folder, force } => {
            commands::init::init_command(&settings, folder, force).await
        }
        Commands::Sync { json } => commands::sync::sync_command(settings, json, cli.quiet).await,
        Commands::List { status, format } => {
            commands::list::list_command(settings, status, format).await
        }
        Commands::Import { path, r#move } => {
            commands::import::import_command(settings, path, r#move).await
        }
        Commands::Clean { execute, .. } => commands::clean::clean_command(settings, execute).await,
        Commands::Cache { action } => commands::cache::cache_command(&settings, action).await,
    };

    if let Err(e) = outcome {
        exit_with_error(&e);
    }
}

fn init_logging(debug: bool, quiet: bool, verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve settings from the user's home directory plus CLI overrides
fn resolve_settings(install_dir: Option<PathBuf>) -> Result<SyncSettings> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::config("could not determine the home directory"))?;

    let mut settings = SyncSettings::for_home(home);
    if let Some(dir) = install_dir {
        settings = settings.with_install_dir(dir);
    }
    Ok(settings)
}

/// Expand a leading `~` to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

fn exit_with_error(error: &Error) -> ! {
    eprintln!("{} {}", style("error:").red().bold(), error);
    if let Some(hint) = error.hint() {
        eprintln!("{} {}", style("hint:").yellow(), hint);
    }
    std::process::exit(1);
}
