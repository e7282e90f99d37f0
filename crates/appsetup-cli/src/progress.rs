//! Download progress bar.

use appsetup_core::host::DownloadProgress;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str = concat!(
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] ",
    "{bytes}/{total_bytes} {msg} ({bytes_per_sec}, {eta})"
);
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

/// Progress bar fed by [`DownloadProgress`] updates.
///
/// The bar starts as a spinner and switches to a bar once the total size is
/// known.
pub struct DownloadBar {
    bar: ProgressBar,
}

impl DownloadBar {
    /// Bar drawn on stderr.
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Bar that draws nothing.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
            bar.set_style(style);
        }
        Self { bar }
    }

    /// Applies one progress update.
    pub fn update(&self, progress: DownloadProgress) {
        if progress.total > 0 && self.bar.length() != Some(progress.total) {
            self.bar.set_length(progress.total);
            if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                self.bar.set_style(style.progress_chars("#>-"));
            }
        }
        if progress.total > 0 {
            self.bar.set_message(format!("{}%", progress.percentage()));
        }
        self.bar.set_position(progress.downloaded);
    }

    /// Bytes seen so far.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Removes the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for DownloadBar {
    fn default() -> Self {
        Self::new()
    }
}
