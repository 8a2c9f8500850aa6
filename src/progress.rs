//! Terminal progress reporting for scans.

use std::time::Duration;

use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};

use crate::scanner::types::{ScanOutcome, ScanProgress};

/// Spinner fed by [`ScanProgress`] events.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Update the display for one progress event.
    pub fn update(&self, progress: &ScanProgress) {
        match progress {
            ScanProgress::Started { root } => {
                self.bar.set_message(format!("Scanning {}", root.display()));
            }
            ScanProgress::Progress {
                dirs_visited,
                files_matched,
                bytes_matched,
            } => {
                self.bar.set_message(format!(
                    "Folders: {} | Matches: {} | Size: {}",
                    dirs_visited,
                    files_matched,
                    format_size(*bytes_matched, BINARY),
                ));
            }
            ScanProgress::Error { path, .. } => {
                self.bar.set_message(format!("Skipped {}", path.display()));
            }
            ScanProgress::Completed { .. } => {}
        }
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a styled summary of the scan outcome.
pub fn print_summary(outcome: &ScanOutcome, elapsed: Duration) {
    let result = &outcome.result;
    println!();
    println!("{}", style("Scan Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Folders:").bold(), result.len());
    println!("  {} {}", style("Files:").bold(), result.total_files());
    println!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(result.total_size_bytes(), BINARY)
    );
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        elapsed.as_secs_f64()
    );
    if !outcome.errors.is_empty() {
        println!(
            "  {} {}",
            style("Access Errors:").yellow().bold(),
            outcome.errors.len()
        );
    }
    println!();
}
