//! Application configuration loaded from a YAML file.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Written on first run so the user has something to edit.
pub const STARTER_CONFIG: &str = r#"# termchat configuration
models:
  - name: "My first model"
    endpoint_url: "https://api.groq.com/openai/v1/chat/completions"
    api_key: "gsk_"
    system_message: "You are a friendly AI assistant."
    # markdown | none
    syntax_highlighting: markdown
    model:
      name: "llama-3.3-70b-versatile"
      max_tokens: 4096
      top_p: 1.0
      temperature: 1.0

# Set to false to print plain text without colors.
enable_chat_decorations: true

# Give up on a request after this many seconds (default: never).
# request_timeout_secs: 600

# Model used by /summarize.
# base_model:
#   endpoint_url: "https://api.groq.com/openai/v1/chat/completions"
#   model_name: "llama-3.1-8b-instant"
#   api_key: "gsk_"
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub models: Vec<ChatModel>,
    #[serde(default = "default_true")]
    pub enable_chat_decorations: bool,
    #[serde(default)]
    pub base_model: Option<BaseModel>,
    /// Upper bound on a whole request in seconds. Unset means no limit.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModel {
    #[serde(default)]
    pub name: Option<String>,
    pub endpoint_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub system_message: Option<String>,
    #[serde(default)]
    pub syntax_highlighting: HighlightMode,
    pub model: ModelParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameters {
    pub name: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// How assistant output is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    #[default]
    Markdown,
    None,
}

/// Lightweight model used for housekeeping prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseModel {
    pub endpoint_url: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

const SUMMARIZE_PROMPT: &str = "Can you summarize the main relevant points of this conversation between \\
    the user and a assistant in a concise and short manner?";

fn default_true() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_top_p() -> f32 {
    0.5
}

fn default_temperature() -> f32 {
    1.0
}

impl AppConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Parses configuration text and checks that it is usable.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(text).context("configuration file looks corrupted")?;
        if config.models.is_empty() {
            bail!("no models configured; add at least one entry under `models`");
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Finds a model by its display name.
    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.display_name() == name)
    }
}

impl ChatModel {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn formatted_system_message(&self) -> Option<String> {
        self.system_message.as_deref().map(sanitize_prompt)
    }
}

impl BaseModel {
    /// A chat model that summarizes conversations.
    pub fn summarizer(&self) -> ChatModel {
        ChatModel {
            name: Some("summarizer".to_string()),
            endpoint_url: self.endpoint_url.clone(),
            api_key: self.api_key.clone(),
            system_message: Some(SUMMARIZE_PROMPT.to_string()),
            syntax_highlighting: HighlightMode::None,
            model: ModelParameters {
                name: self.model_name.clone(),
                max_tokens: 4096,
                top_p: default_top_p(),
                temperature: default_temperature(),
            },
        }
    }
}

/// Joins lines ending in a backslash with the following line and trims the
/// result.
pub fn sanitize_prompt(prompt: &str) -> String {
    static CONTINUATION: OnceLock<Regex> = OnceLock::new();
    let re = CONTINUATION
        .get_or_init(|| Regex::new(r"(?m)\\[ \t]*$\s*").expect("continuation pattern is valid"));
    re.replace_all(prompt, "").trim().to_string()
}

/// Default configuration file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("termchat").join("config.yaml"))
}

/// Directory for chats, prompt history and logs.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("termchat"))
}

/// Writes the starter file if `path` does not exist. Returns whether it did.
pub fn write_starter_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, STARTER_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
