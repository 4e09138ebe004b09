//! Spinner shown while a build runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner for work without a known length.
///
/// Hidden when stderr is not a terminal, in CI, or when `hidden` is set, so
/// piped output never carries control sequences.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str, hidden: bool) -> Self {
        if hidden || super::is_ci() || !console::user_attended_stderr() {
            return Self {
                pb: ProgressBar::hidden(),
            };
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒", "●"]);
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Remove the spinner line.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_spinner_is_inert() {
        let spinner = Spinner::new("Building", true);
        spinner.set_message("Still building");
        spinner.finish();
    }
}
