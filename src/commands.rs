//! Slash command handling.

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    NotACommand,
    Help,
    Quit,
    /// `/switch` alone lists the models; with an argument it selects one.
    Switch(Option<String>),
    Clear,
    Reset,
    Summarize,
    Tokens,
    SystemPrompt,
    OpenConfig,
    Reload,
    Invalid(String),
}

/// Markdown shown by `/help`.
pub const HELP_TEXT: &str = "\
## Commands

| Command | Description |
|:-|:-|
| `/help` | show this help |
| `/switch [n]` | list the configured models, or switch to model `n` |
| `/clear` | clear the screen |
| `/reset` | forget the current conversation |
| `/summarize` | replace the conversation with a summary |
| `/tokens` | show the estimated token usage |
| `/sysprompt` | show the system message |
| `/config` | open the configuration file |
| `/reload` | reload the configuration |
| `/exit` | leave |

End a line with `\\` to continue typing on the next one.
Press *Ctrl+C* while an answer is streaming to stop it.
";

/// Process a potential slash command.
pub fn process_command(input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/quit" | "/exit" | "/q" => CommandResult::Quit,
        "/help" | "/?" => CommandResult::Help,
        "/clear" => CommandResult::Clear,
        "/switch" => {
            if arg.is_empty() {
                CommandResult::Switch(None)
            } else {
                CommandResult::Switch(Some(arg.to_string()))
            }
        }
        "/reset" => CommandResult::Reset,
        "/summarize" => CommandResult::Summarize,
        "/tokens" => CommandResult::Tokens,
        "/sysprompt" => CommandResult::SystemPrompt,
        "/config" => CommandResult::OpenConfig,
        "/reload" => CommandResult::Reload,
        other => CommandResult::Invalid(other.to_string()),
    }
}

/// The text to send for a line of input, or `None` when it is blank.
/// Chat text is passed on exactly as typed.
pub fn user_message(input: &str) -> Option<&str> {
    if input.trim().is_empty() {
        None
    } else {
        Some(input)
    }
}

/// Parses the 1-based model number given to `/switch`.
pub fn parse_model_number(arg: &str, model_count: usize) -> Option<usize> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= model_count => Some(n - 1),
        _ => None,
    }
}
