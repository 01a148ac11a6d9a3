//! Spinner shown while waiting for the first token.

use std::time::Duration;

use crossterm::style::{self, Stylize};
use indicatif::{ProgressBar, ProgressStyle};

use super::theme;

pub fn waiting_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(&format!("{{spinner}} {}", style::style("{msg}").with(theme::DIM_COLOR)))
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("waiting...");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
