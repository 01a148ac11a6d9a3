//! Chat session management: current model, conversation, persistence.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use crossterm::style::{self, Stylize};

use crate::config::{AppConfig, ChatModel};
use crate::highlight;
use crate::history::{ChatContext, ChatStore, Role};
use crate::inference::{estimate_tokens, InferenceClient, InferenceError, StreamOutcome};
use crate::ui::{self, theme};

/// Session statistics shown by `/tokens`.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub total_turns: usize,
    pub completion_tokens: usize,
}

/// Result of a summarization.
#[derive(Debug, Clone, Copy)]
pub struct SummaryReport {
    pub from_tokens: usize,
    pub to_tokens: usize,
}

impl SummaryReport {
    pub fn reduction_percent(&self) -> f64 {
        if self.from_tokens == 0 {
            return 0.0;
        }
        (self.from_tokens as f64 - self.to_tokens as f64) / self.from_tokens as f64 * 100.0
    }
}

/// Everything the chat loop needs to run turns against the current model.
pub struct Session {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub stats: SessionStats,
    current: usize,
    context: ChatContext,
    store: ChatStore,
    client: InferenceClient,
    cancel: Arc<AtomicBool>,
    waiting: Arc<AtomicBool>,
}

impl Session {
    /// Opens the store and selects the startup model: `preferred` if given,
    /// otherwise the last one used, otherwise the first configured.
    pub fn new(
        config: AppConfig,
        config_path: PathBuf,
        store: ChatStore,
        preferred: Option<&str>,
    ) -> Result<Self> {
        let current = match preferred {
            Some(name) => config
                .model_index(name)
                .ok_or_else(|| anyhow!("no model named \"{name}\" in the configuration"))?,
            None => match store.last_model() {
                Some(last) => config.model_index(&last).unwrap_or_else(|| {
                    ui::warn(&format!("The last used model (\"{last}\") is not available."));
                    0
                }),
                None => 0,
            },
        };

        let client = InferenceClient::with_timeout(config.request_timeout())?;
        let mut session = Self {
            config,
            config_path,
            stats: SessionStats::default(),
            current,
            context: ChatContext::default(),
            store,
            client,
            cancel: Arc::new(AtomicBool::new(false)),
            waiting: Arc::new(AtomicBool::new(false)),
        };
        session.reload_context()?;
        Ok(session)
    }

    pub fn model(&self) -> &ChatModel {
        &self.config.models[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    /// Flag set by the interrupt handler to cancel a streaming response.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Set while a response is being received.
    pub fn waiting_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.waiting)
    }

    /// Loads the saved conversation for the current model, or starts one.
    fn reload_context(&mut self) -> Result<()> {
        let model = self.model();
        let name = model.display_name().to_string();
        let (context, resumed) = match self.store.load(&name) {
            Ok(Some(context)) => (context, true),
            Ok(None) => (ChatContext::new(&name, model.formatted_system_message()), false),
            Err(err) => {
                tracing::warn!(error = %err, model = %name, "saved chat unreadable; starting fresh");
                (ChatContext::new(&name, model.formatted_system_message()), false)
            }
        };
        self.context = context;
        tracing::info!(model = %name, resumed, messages = self.context.messages.len(), "chat context loaded");

        println!(
            "You're talking with {} ({}). Type {} to get help.",
            style::style(&name).with(theme::ACCENT_COLOR),
            self.model().model.name,
            style::style("/help").bold()
        );
        if resumed {
            println!(
                "{} you are continuing a previous conversation with {} {}.",
                style::style("Important:").with(theme::WARNING_COLOR),
                style::style(format!("{} messages", self.context.messages.len())).bold(),
                style::style(format!("(~ {} tokens)", self.context.token_usage())).with(theme::DIM_COLOR)
            );
            println!("Type {} to start a fresh new conversation.", style::style("/reset").bold());
        }
        println!();
        Ok(())
    }

    pub fn switch_model(&mut self, index: usize) -> Result<()> {
        if index >= self.config.models.len() {
            return Err(anyhow!("model number out of range"));
        }
        self.current = index;
        self.store.set_last_model(self.model().display_name())?;
        self.reload_context()
    }

    /// Re-reads the configuration file and restarts on the same model when
    /// it still exists.
    pub fn reload_config(&mut self) -> Result<()> {
        let config = AppConfig::load(&self.config_path)?;
        let name = self.model().display_name().to_string();
        self.current = config.model_index(&name).unwrap_or(0);
        self.client = InferenceClient::with_timeout(config.request_timeout())?;
        self.config = config;
        tracing::info!(path = %self.config_path.display(), "configuration reloaded");
        self.reload_context()
    }

    /// Forgets the current conversation and starts a fresh one.
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(&self.context.model_name)?;
        self.stats = SessionStats::default();
        self.reload_context()
    }

    /// Sends `input` and streams the answer to the terminal.
    pub fn run_turn(&mut self, input: &str) -> Result<()> {
        self.context.push(Role::User, input);
        self.cancel.store(false, Ordering::SeqCst);
        self.waiting.store(true, Ordering::SeqCst);

        let model = self.config.models[self.current].clone();
        let mut highlighter =
            highlight::for_mode(model.syntax_highlighting, self.config.enable_chat_decorations);
        let mut spinner = Some(ui::spinner::waiting_spinner());
        let mut answer = String::new();

        let result = self.client.stream_completion(
            &model,
            &self.context.messages,
            &self.cancel,
            |delta| {
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
                answer.push_str(delta);
                highlighter.write(delta);
            },
        );

        if let Some(pb) = spinner.take() {
            pb.finish_and_clear();
        }
        highlighter.finish();
        self.waiting.store(false, Ordering::SeqCst);

        if !answer.is_empty() {
            self.stats.completion_tokens += estimate_tokens(&answer);
            self.context.push(Role::Assistant, answer);
        }
        self.stats.total_turns += 1;
        if let Err(err) = self.store.save(&self.context) {
            tracing::warn!(error = %err, "failed to save chat");
        }

        print!("\n\n");
        std::io::stdout().flush().ok();

        match result {
            Ok(StreamOutcome::Completed) => Ok(()),
            Ok(StreamOutcome::Cancelled) => {
                println!("{}", style::style("Operation cancelled by the user.").with(theme::DIM_COLOR));
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the conversation with a summary produced by the base model.
    pub fn summarize(&mut self) -> Result<SummaryReport> {
        let base = self
            .config
            .base_model
            .clone()
            .ok_or_else(|| anyhow!("No base model was defined in the app configuration."))?;
        let summarizer = base.summarizer();
        let from_tokens = self.context.token_usage();

        let mut request = ChatContext::new("summarizer", summarizer.formatted_system_message());
        request.push(Role::User, self.context.transcript());

        let spinner = ui::spinner::waiting_spinner();
        let summary = self.client.next_message(&summarizer, &request.messages);
        spinner.finish_and_clear();
        let summary = summary?;

        let mut fresh = ChatContext::new(&self.context.model_name, self.model().formatted_system_message());
        fresh.push(Role::User, format!("Context from last conversation:\n\n{summary}"));
        self.context = fresh;
        self.store.save(&self.context)?;

        Ok(SummaryReport { from_tokens, to_tokens: estimate_tokens(&summary) })
    }
}

/// Prints an inference error the way the chat loop shows it.
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<InferenceError>() {
        Some(InferenceError::Status { status, reason, body }) => {
            println!(
                "{} the completions endpoint returned an {}:\n",
                style::style("Error:").with(theme::ERROR_COLOR),
                style::style(format!("{status} {reason}")).bold()
            );
            match serde_json::from_str::<serde_json::Value>(body) {
                Ok(json) => println!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.clone())
                ),
                Err(_) => println!("{body}"),
            }
        }
        Some(other) => println!(
            "{} exception raised from the AI client:\n    {}\n",
            style::style("Error:").with(theme::ERROR_COLOR),
            style::style(other.to_string()).with(theme::WARNING_COLOR)
        ),
        None => println!("{} {err:#}\n", style::style("Error:").with(theme::ERROR_COLOR)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reduction() {
        let report = SummaryReport { from_tokens: 200, to_tokens: 50 };
        assert_eq!(report.reduction_percent(), 75.0);
        let empty = SummaryReport { from_tokens: 0, to_tokens: 0 };
        assert_eq!(empty.reduction_percent(), 0.0);
    }
}
