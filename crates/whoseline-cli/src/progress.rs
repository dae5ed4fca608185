//! Terminal progress for the per-line pipeline

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use whoseline_core::{DialogEntry, ProgressObserver};

/// Progress bar advanced once per synthesized line
pub struct LineProgress {
    bar: ProgressBar,
}

impl LineProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let template = "{bar:30.green/white} {pos}/{len} {wide_msg}";
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style);
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for LineProgress {
    fn line_started(&self, index: usize, total: usize, voice: &str, entry: &DialogEntry) {
        self.bar.println(format!(
            "Processing line {}/{}: {} says: \"{}\"",
            index, total, voice, entry.line
        ));
        self.bar.set_message(voice.to_string());
    }

    fn line_finished(&self, _index: usize, _total: usize, duration: Duration) {
        self.bar.set_message(format!("{:.2}s", duration.as_secs_f64()));
        self.bar.inc(1);
    }
}

impl Drop for LineProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
