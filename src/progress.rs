use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use crate::error::SubsError;
use crate::workflow::{BatchObserver, BatchReport, ItemOutcome};

/// Terminal progress bar over the items of a batch
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ProgressObserver {
    fn on_batch_started(&mut self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_item_started(&mut self, path: &Path) {
        self.bar.set_message(Self::file_name(path));
    }

    fn on_item_complete(&mut self, _path: &Path) {
        self.bar.inc(1);
    }

    fn on_item_skipped(&mut self, _path: &Path, _outcome: &ItemOutcome) {
        self.bar.inc(1);
    }

    fn on_item_failed(&mut self, path: &Path, error: &SubsError) {
        self.bar.println(format!("Failed: {} ({})", path.display(), error));
        self.bar.inc(1);
    }

    fn on_batch_finished(&mut self, report: &BatchReport) {
        let message = if report.cancelled { "cancelled" } else { "finished" };
        self.bar.finish_with_message(message);
    }
}
