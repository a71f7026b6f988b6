//! Progress reporting for dumps and restores.
//!
//! The extractor and the restore scheduler report through a [`Progress`]
//! sink handed to them by the caller. [`LogProgress`] only emits tracing
//! events; [`BarProgress`] drives an `indicatif` bar for interactive
//! terminals.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Receiver of progress events. Called concurrently by restore workers.
pub trait Progress: Send + Sync {
    /// A configured key has been extracted; `total` records so far.
    fn extracted(&self, key: &str, total: usize);

    /// A restore of `total` records is about to be dispatched.
    fn restore_started(&self, total: usize);

    /// One record has been written to the store.
    fn restored(&self, key: &str);

    /// The run is over, successfully or not.
    fn finished(&self);
}

/// Progress reported as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn extracted(&self, key: &str, total: usize) {
        info!(key = %key, total = total, "Key extracted");
    }

    fn restore_started(&self, total: usize) {
        info!(total = total, "Restoring data set");
    }

    fn restored(&self, key: &str) {
        debug!(key = %key, "Key restored");
    }

    fn finished(&self) {}
}

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

/// Progress drawn as a terminal progress bar.
#[derive(Debug, Clone)]
pub struct BarProgress {
    bar: ProgressBar,
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl Progress for BarProgress {
    fn extracted(&self, key: &str, total: usize) {
        debug!(key = %key, total = total, "Key extracted");
        self.bar.set_message(format!("{total} keys extracted (last: {key})"));
    }

    fn restore_started(&self, total: usize) {
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            self.bar.set_style(style.progress_chars("=> "));
        }
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message("restoring");
    }

    fn restored(&self, key: &str) {
        debug!(key = %key, "Key restored");
        self.bar.inc(1);
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}
