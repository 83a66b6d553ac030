//! CLI presenter for output formatting

use std::time::Duration as StdDuration;

use chrono::Local;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::clip::Clip;

/// Presenter for CLI output formatting.
///
/// Status goes to stderr; clip paths and listings go to stdout.
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(StdDuration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Format elapsed recording time, with the limit when one is set
    pub fn format_elapsed(&self, elapsed: StdDuration, limit: Option<StdDuration>) -> String {
        match limit {
            Some(limit) => format!("{} / {}", clock(elapsed), clock(limit)),
            None => clock(elapsed),
        }
    }

    /// Update the recording spinner
    pub fn update_recording_progress(&self, elapsed: StdDuration, limit: Option<StdDuration>) {
        let progress = self.format_elapsed(elapsed, limit);
        self.update_spinner(&format!("{} Recording {}", "●".red(), progress));
    }

    /// Print recorder status
    pub fn recorder_status(&self, state: &str) {
        eprintln!("{} Recorder: {}", "●".cyan(), state);
    }

    /// Print one clip as a listing row
    pub fn clip_row(&self, clip: &Clip) {
        println!("{}", self.format_clip_row(clip));
    }

    /// Format one clip as a listing row
    pub fn format_clip_row(&self, clip: &Clip) -> String {
        let created = clip
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M");
        format!(
            "{}  {:>9}  {:>9}  {}",
            created.to_string().dimmed(),
            clip.formatted_duration(),
            clip.human_readable_size(),
            clip.path.display()
        )
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn clock(duration: StdDuration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
