//! termchat: chat with language models from the terminal.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use anyhow::{anyhow, Context, Result};
use crossterm::style::{self, Stylize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use termchat::commands::{self, CommandResult};
use termchat::config::{self, AppConfig};
use termchat::history::ChatStore;
use termchat::session::{self, Session};
use termchat::ui::{self, theme};

fn get_arg(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn init_logging(data_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::never(data_dir, "termchat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if verbose { "termchat=debug" } else { "termchat=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("failed to initialize logging")?;
    Ok(guard)
}

fn print_welcome() {
    let width = crossterm::terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
    let bar = "─".repeat(width.min(60));

    println!();
    println!("{}", style::style(&bar).with(theme::DIM_COLOR));
    println!("  {} {}",
        style::style("termchat").with(theme::ACCENT_COLOR).bold(),
        style::style(format!("v{}", env!("CARGO_PKG_VERSION"))).with(theme::DIM_COLOR));
    println!("  Type {} for commands, {} to exit",
        style::style("/help").with(theme::USER_COLOR),
        style::style("Ctrl+D").with(theme::USER_COLOR));
    println!("{}", style::style(&bar).with(theme::DIM_COLOR));
    println!();
}

fn list_models(session: &Session) {
    println!("Available models:");
    for (i, model) in session.config.models.iter().enumerate() {
        let marker = if i == session.current_index() { "*" } else { " " };
        println!("  {marker} {} {}",
            style::style(format!("{}.", i + 1)).bold(),
            model.display_name());
    }
    println!("Type {} to switch.", style::style("/switch <n>").bold());
}

fn handle_command(session: &mut Session, command: CommandResult) -> Result<()> {
    match command {
        CommandResult::NotACommand | CommandResult::Quit => {}
        CommandResult::Help => {
            ui::render::render_markdown(commands::HELP_TEXT, session.config.enable_chat_decorations)
        }
        CommandResult::Clear => {
            print!("\x1B[2J\x1B[1;1H");
            print_welcome();
        }
        CommandResult::Switch(None) => list_models(session),
        CommandResult::Switch(Some(arg)) => {
            match commands::parse_model_number(&arg, session.config.models.len()) {
                Some(index) => session.switch_model(index)?,
                None => ui::warn(&format!("\"{arg}\" is not a valid model number.")),
            }
        }
        CommandResult::Reset => session.reset()?,
        CommandResult::Summarize => {
            let report = session.summarize()?;
            println!("Conversation summarized: {} -> {} tokens ({:.0}% reduction).\n",
                report.from_tokens, report.to_tokens, report.reduction_percent());
        }
        CommandResult::Tokens => {
            println!("Context: {} messages, ~{} tokens. This session: {} turns, ~{} completion tokens.\n",
                session.context().messages.len(),
                session.context().token_usage(),
                session.stats.total_turns,
                session.stats.completion_tokens);
        }
        CommandResult::SystemPrompt => match session.context().system_message() {
            Some(message) => println!("{}\n", style::style(message).with(theme::DIM_COLOR)),
            None => println!("{}\n", style::style("No system message.").with(theme::DIM_COLOR)),
        },
        CommandResult::OpenConfig => {
            open::that(&session.config_path).with_context(|| {
                format!("failed to open {}", session.config_path.display())
            })?;
            println!("Type {} after editing it.", style::style("/reload").bold());
        }
        CommandResult::Reload => session.reload_config()?,
        CommandResult::Invalid(command) => {
            tracing::debug!(%command, "unknown command");
            println!("Invalid command.");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("termchat: chat with language models from the terminal");
        println!();
        println!("USAGE:");
        println!("  termchat [OPTIONS]");
        println!();
        println!("OPTIONS:");
        println!("  --config <path>       Configuration file (default: platform config dir)");
        println!("  --model <name>        Start with the named model");
        println!("  --plain               Disable colors and decorations");
        println!("  --verbose             Debug logging to the log file");
        println!("  -h, --help            Show this help");
        return Ok(());
    }

    let config_path = match get_arg(&args, "--config") {
        Some(path) => PathBuf::from(path),
        None => config::default_config_path()
            .ok_or_else(|| anyhow!("cannot determine the configuration directory"))?,
    };
    if config::write_starter_if_missing(&config_path)? {
        println!("A starter configuration was written to {}.", config_path.display());
        println!("Edit it to add your endpoints, then start termchat again.");
        std::process::exit(1);
    }

    let data_dir = config::data_dir().ok_or_else(|| anyhow!("cannot determine the data directory"))?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let _log_guard = init_logging(&data_dir, has_flag(&args, "--verbose"))?;

    let mut config = AppConfig::load(&config_path)?;
    if has_flag(&args, "--plain") {
        config.enable_chat_decorations = false;
    }
    if !config.enable_chat_decorations {
        style::force_color_output(false);
    }
    tracing::info!(models = config.models.len(), path = %config_path.display(), "configuration loaded");

    print_welcome();
    let store = ChatStore::open(&data_dir)?;
    let mut session = Session::new(config, config_path, store, get_arg(&args, "--model").as_deref())?;

    let waiting = session.waiting_flag();
    let cancel = session.cancel_flag();
    ctrlc::set_handler(move || {
        if waiting.load(Ordering::SeqCst) {
            cancel.store(true, Ordering::SeqCst);
        } else {
            println!("\nBye!");
            std::process::exit(0);
        }
    })
    .context("failed to install the interrupt handler")?;

    let mut prompt = ui::prompt::InputPrompt::new(Some(data_dir.join("history.txt")))?;

    loop {
        let input = match prompt.read_input() {
            Some(s) => s,
            None => {
                println!();
                break;
            }
        };

        let Some(input) = commands::user_message(&input) else {
            continue;
        };

        let command = commands::process_command(input);
        let result = match command {
            CommandResult::Quit => break,
            CommandResult::NotACommand => session.run_turn(input),
            other => handle_command(&mut session, other),
        };
        if let Err(err) = result {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            session::report_error(&err);
        }
    }

    prompt.save_history();
    println!("{}", style::style("Bye!").with(theme::DIM_COLOR));
    Ok(())
}
