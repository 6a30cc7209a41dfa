//! Progress bar helpers built on indicatif.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a percentage bar for an export run.
pub fn export_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with a success message.
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(message.to_string());
}
