//! Input prompt handling with rustyline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::style::{self, Stylize};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::theme;

/// The interactive prompt handler.
pub struct InputPrompt {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl InputPrompt {
    pub fn new(history_path: Option<PathBuf>) -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to create line editor")?;
        let mut prompt = Self { editor, history_path };

        if let Some(ref path) = prompt.history_path {
            if let Err(err) = prompt.editor.load_history(path) {
                tracing::debug!(error = %err, "no prompt history loaded");
            }
        }

        Ok(prompt)
    }

    /// Read a line of input. Supports backslash continuation for multi-line.
    /// Returns None on EOF.
    pub fn read_input(&mut self) -> Option<String> {
        let prompt_str = format!("{} ", style::style(">").with(theme::USER_COLOR).bold());

        let mut full_input = String::new();
        let mut continuation = false;

        loop {
            let p = if continuation { "... " } else { &prompt_str };
            match self.editor.readline(p) {
                Ok(line) => {
                    if let Some(head) = line.strip_suffix('\\') {
                        full_input.push_str(head);
                        full_input.push('\n');
                        continuation = true;
                        continue;
                    }
                    full_input.push_str(&line);
                    if !full_input.trim().is_empty() {
                        let _ = self.editor.add_history_entry(full_input.as_str());
                    }
                    return Some(full_input);
                }
                Err(ReadlineError::Interrupted) => {
                    if continuation {
                        full_input.clear();
                        continuation = false;
                        continue;
                    }
                    return Some(String::new());
                }
                Err(ReadlineError::Eof) => return None,
                Err(err) => {
                    tracing::error!(error = %err, "prompt failed");
                    return None;
                }
            }
        }
    }

    /// Save history on exit.
    pub fn save_history(&mut self) {
        if let Some(ref path) = self.history_path {
            if let Err(err) = self.editor.save_history(path) {
                tracing::warn!(error = %err, "failed to save prompt history");
            }
        }
    }
}
