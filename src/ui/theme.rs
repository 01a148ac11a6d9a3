//! Color theme and styling constants.

use crossterm::style::Color;

use crate::render::{Decoration, Style};

pub const USER_COLOR: Color = Color::Rgb { r: 100, g: 149, b: 237 };    // Cornflower blue
pub const ACCENT_COLOR: Color = Color::Rgb { r: 95, g: 215, b: 175 };   // Aquamarine
pub const WARNING_COLOR: Color = Color::Rgb { r: 215, g: 215, b: 135 }; // Khaki
pub const ERROR_COLOR: Color = Color::Rgb { r: 215, g: 95, b: 95 };     // Indian red
pub const DIM_COLOR: Color = Color::Grey;
pub const MUTED_COLOR: Color = Color::Rgb { r: 128, g: 128, b: 128 };
pub const CODE_COLOR: Color = Color::Rgb { r: 95, g: 215, b: 215 };     // Cadet blue
pub const LINK_COLOR: Color = Color::Rgb { r: 0, g: 175, b: 215 };      // Deep sky blue

pub const HEADING: Style = Style::fg(Color::White).with(Decoration::BOLD.union(Decoration::UNDERLINE));
pub const CODE_SPAN: Style = Style::fg(CODE_COLOR);
pub const INDENTED_CODE: Style = Style::fg(CODE_COLOR);
pub const LINK: Style = Style::fg(LINK_COLOR).with(Decoration::UNDERLINE);
pub const THINKING: Style = Style::fg(MUTED_COLOR).with(Decoration::ITALIC);
pub const DELIMITER: Style = Style::fg(MUTED_COLOR);
pub const RULE: Style = Style::fg(MUTED_COLOR);
pub const QUOTE_PREFIX: Style = Style::fg(MUTED_COLOR);

/// Default foreground for code tokens no rule matched.
pub const CODE_DEFAULT: Style = Style::rgb(0xd4, 0xd4, 0xd4);
