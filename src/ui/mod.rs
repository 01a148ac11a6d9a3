pub mod prompt;
pub mod render;
pub mod spinner;
pub mod theme;

use crossterm::style::{self, Stylize};

/// Prints a one-line warning.
pub fn warn(message: &str) {
    println!("{} {message}", style::style("Warning:").with(theme::WARNING_COLOR));
}
