//! Chat contexts and their on-disk persistence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::inference::estimate_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// The conversation held with one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContext {
    pub model_name: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatContext {
    /// A fresh conversation, seeded with the system message if there is one.
    pub fn new(model_name: &str, system_message: Option<String>) -> Self {
        let messages = system_message
            .filter(|m| !m.is_empty())
            .map(|m| vec![ChatMessage::new(Role::System, m)])
            .unwrap_or_default();
        Self { model_name: model_name.to_string(), messages }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    pub fn system_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Approximate number of tokens in the conversation.
    pub fn token_usage(&self) -> usize {
        self.messages.iter().map(|m| estimate_tokens(&m.content)).sum()
    }

    /// Role-prefixed plain-text transcript.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.title(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    last_model: Option<String>,
}

/// JSON-file store: one file per model under `chats/`, plus `state.json`.
pub struct ChatStore {
    root: PathBuf,
}

impl ChatStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("chats"))
            .with_context(|| format!("failed to create {}", root.display()))?;
        Ok(Self { root })
    }

    fn chat_path(&self, model_name: &str) -> PathBuf {
        self.root.join("chats").join(format!("{}.json", file_stem(model_name)))
    }

    fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn load(&self, model_name: &str) -> Result<Option<ChatContext>> {
        let path = self.chat_path(model_name);
        if !path.exists() {
            return Ok(None);
        }
        let context = read_json(&path)?;
        Ok(Some(context))
    }

    pub fn save(&self, context: &ChatContext) -> Result<()> {
        write_json(&self.chat_path(&context.model_name), context)
    }

    pub fn remove(&self, model_name: &str) -> Result<()> {
        let path = self.chat_path(model_name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    pub fn last_model(&self) -> Option<String> {
        let path = self.state_path();
        if !path.exists() {
            return None;
        }
        match read_json::<StoreState>(&path) {
            Ok(state) => state.last_model,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable state file");
                None
            }
        }
    }

    pub fn set_last_model(&self, model_name: &str) -> Result<()> {
        let state = StoreState { last_model: Some(model_name.to_string()) };
        write_json(&self.state_path(), &state)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Maps a model name to a safe file name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}
