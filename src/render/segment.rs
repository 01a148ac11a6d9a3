//! Styled text segments, the unit handed to the terminal.

use bitflags::bitflags;
use crossterm::style::Color;

bitflags! {
    /// Text decorations a segment may carry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Decoration: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
    }
}

/// Foreground color plus decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub decoration: Decoration,
}

impl Style {
    pub const PLAIN: Style = Style { fg: None, decoration: Decoration::empty() };

    pub const fn fg(color: Color) -> Self {
        Style { fg: Some(color), decoration: Decoration::empty() }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Style::fg(Color::Rgb { r, g, b })
    }

    pub const fn decorated(decoration: Decoration) -> Self {
        Style { fg: None, decoration }
    }

    /// Adds `decoration` on top of whatever this style already carries.
    pub const fn with(self, decoration: Decoration) -> Self {
        Style { fg: self.fg, decoration: self.decoration.union(decoration) }
    }

    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.decoration.is_empty()
    }
}

/// A styled run of text. Never mutated once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
    /// Destination for clickable links.
    pub link: Option<String>,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self { text: text.into(), style, link: None }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::PLAIN)
    }

    pub fn link(text: impl Into<String>, style: Style, target: impl Into<String>) -> Self {
        Self { text: text.into(), style, link: Some(target.into()) }
    }
}

/// Concatenates segment texts, ignoring styles.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}
