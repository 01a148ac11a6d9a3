//! Markdown rendering for fixed help text.

use termimad::MadSkin;

use super::theme;

/// Create a configured terminal markdown skin.
pub fn make_skin(decorations: bool) -> MadSkin {
    if !decorations {
        return MadSkin::no_style();
    }
    let mut skin = MadSkin::default();
    skin.bold.set_fg(crossterm::style::Color::White);
    skin.italic.set_fg(theme::MUTED_COLOR);
    skin.headers[0].set_fg(theme::ACCENT_COLOR);
    skin.headers[1].set_fg(theme::ACCENT_COLOR);
    skin.inline_code.set_fg(theme::CODE_COLOR);
    skin
}

/// Render markdown text to the terminal.
pub fn render_markdown(text: &str, decorations: bool) {
    make_skin(decorations).print_text(text);
}
