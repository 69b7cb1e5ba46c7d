//! Indicatif-backed progress rendering

use fontsync_sync::{ProgressSink, ProgressUpdate, SyncPhase};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress sink rendering engine updates onto a single bar
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    /// Create a sink with a live spinner/bar, or a hidden one in quiet mode
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { bar }
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarSink {
    fn update(&self, update: ProgressUpdate) {
        match update.phase {
            SyncPhase::Scanning => {
                self.bar
                    .set_message(format!("scanning fonts... ({} found)", update.completed));
            }
            SyncPhase::Fingerprinting => {
                self.bar.set_length(update.total as u64);
                self.bar.set_position(update.completed as u64);
                self.bar.set_message("checking differences...".to_string());
            }
            SyncPhase::Applying => {
                self.bar.set_length(update.total as u64);
                self.bar.set_position(update.completed as u64);
                match update.detail {
                    Some(name) => self.bar.set_message(format!("installing: {name}")),
                    None => self.bar.set_message("installing...".to_string()),
                }
            }
            SyncPhase::Cleaning => {
                self.bar.set_length(update.total as u64);
                self.bar.set_position(update.completed as u64);
                match update.detail {
                    Some(name) => self.bar.set_message(format!("removing: {name}")),
                    None => self.bar.set_message("removing...".to_string()),
                }
            }
        }
    }
}
