mod view;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use parley_common::ParleyConfig;
use parley_core::{ChatWidget, SubmitOutcome, WidgetContext};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use view::TerminalView;

/// Command-line arguments for the Parley CLI
#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley - streaming chat with sentence-level translation and speech"
)]
pub struct Args {
    /// Path to the configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Language tag to start in, e.g. mr-IN
    #[clap(short, long)]
    lang: Option<String>,

    /// Chat endpoint URL
    #[clap(long)]
    chat_url: Option<String>,

    /// Translation endpoint URL
    #[clap(long)]
    translate_url: Option<String>,

    /// Disable voice input and output
    #[clap(long)]
    no_speech: bool,

    /// Enable debug mode
    #[clap(short, long)]
    debug: bool,

    /// List available languages
    #[clap(long)]
    list_languages: bool,
}

const DEFAULT_LOG_LEVEL: &str = "info";

/// Filter directive for the subscriber; `--debug` wins over the configured level
fn log_directive(debug: bool, configured: &str) -> String {
    let configured = configured.trim();
    if debug {
        "debug".to_string()
    } else if configured.is_empty() {
        DEFAULT_LOG_LEVEL.to_string()
    } else {
        configured.to_string()
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_cyan().bold());
    println!("  {}  switch language", "/lang <tag>".bright_yellow());
    println!("  {}       list languages", "/langs".bright_yellow());
    println!("  {}         speak your message", "/mic".bright_yellow());
    println!("  {}   read a reply aloud (default: latest)", "/speak [n]".bright_yellow());
    println!("  {}        this help", "/help".bright_yellow());
    println!("  {}  leave", "quit | exit".bright_yellow());
}

fn print_languages(widget: &ChatWidget) {
    println!("{}", "🌐 Available languages:".bright_cyan().bold());
    for tag in widget.languages() {
        if tag == widget.language() {
            println!("• {} {}", tag.as_str().bright_green().bold(), "(current)".dimmed());
        } else {
            println!("• {}", tag.as_str().bright_blue());
        }
    }
}

fn report(outcome: &SubmitOutcome, view: &TerminalView) {
    match outcome {
        SubmitOutcome::Completed { text, .. } => view.render_final(text),
        SubmitOutcome::Failed { error, .. } => {
            error!("Chat request failed: {}", error);
        }
        SubmitOutcome::Busy => {
            println!("{}", "⏳ Still answering the previous message.".yellow());
        }
        SubmitOutcome::Ignored => {}
    }
}

async fn speak(widget: &ChatWidget, view: &TerminalView, arg: Option<&str>) {
    let bots: Vec<_> = view.conversation().bot_turns().map(|t| t.id).collect();
    let target = match arg {
        Some(n) => match n.parse::<usize>() {
            Ok(n) if n >= 1 && n <= bots.len() => Some(bots[n - 1]),
            _ => None,
        },
        None => bots.last().copied(),
    };

    let Some(id) = target else {
        println!("{}", "❌ No such reply to speak.".red());
        return;
    };
    if let Err(e) = widget.speak_turn(id, view).await {
        println!("{}", format!("❌ Could not speak: {}", e).red());
    }
}

/// Main conversation loop
async fn conversation_loop(mut widget: ChatWidget, mut view: TerminalView) -> Result<()> {
    widget.mount(&mut view);

    println!(
        "{}",
        format!(
            "💬 Chatting in {}. Type '/help' for commands, 'quit' or 'exit' to stop.",
            widget.language()
        )
        .bright_green()
    );
    if !view.mic_visible() {
        println!("{}", "🎙  Voice input unavailable.".dimmed());
    }
    println!();

    loop {
        print!("{}", "You: ".bright_cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        let mut parts = input.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match command.as_str() {
            "quit" | "exit" => {
                println!("{}", "👋 Goodbye!".bright_green());
                break;
            }
            "/help" => print_help(),
            "/langs" => print_languages(&widget),
            "/lang" => match arg {
                Some(tag) => match widget.select_language(tag) {
                    Ok(tag) => println!("{}", format!("🌐 Language set to {}", tag).bright_green()),
                    Err(e) => println!("{}", format!("❌ {}", e).red()),
                },
                None => print_languages(&widget),
            },
            "/mic" => {
                if !view.mic_visible() {
                    println!("{}", "❌ Voice input is not available.".red());
                } else {
                    let outcome = widget.mic_clicked(&mut view).await;
                    report(&outcome, &view);
                }
            }
            "/speak" => speak(&widget, &view, arg).await,
            _ => {
                let outcome = widget.submit(input, &mut view).await;
                report(&outcome, &view);
            }
        }

        println!();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Setup tracing on stderr so it stays out of the streamed reply. The
    // configured level is applied once the config file has been read.
    let builder = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(log_directive(args.debug, DEFAULT_LOG_LEVEL)))
        .with_writer(io::stderr)
        .with_filter_reloading();
    let filter_handle = builder.reload_handle();
    tracing::subscriber::set_global_default(builder.finish())?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => ParleyConfig::config_path()?,
    };
    let mut config = ParleyConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    config
        .apply_env_overrides()
        .context("Invalid PARLEY_* environment override")?;
    if let Some(url) = args.chat_url {
        config.endpoints.chat_url = url;
    }
    if let Some(url) = args.translate_url {
        config.endpoints.translate_url = url;
    }
    if args.no_speech {
        config.speech.enabled = false;
    }

    let directive = log_directive(args.debug, &config.log_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        warn!("Ignoring log_level '{}': {}", config.log_level, e);
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    });
    filter_handle
        .reload(filter)
        .context("Failed to apply configured log level")?;

    if args.list_languages {
        println!("{}", "🌐 Available languages:".bright_cyan().bold());
        for tag in &config.language.available {
            println!("• {}", tag.as_str().bright_blue());
        }
        return Ok(());
    }

    info!("Starting Parley CLI");
    info!("Config: {:?}", config_path);
    info!("Chat endpoint: {}", config.endpoints.chat_url);

    let context = WidgetContext::from_config(&config).context("Failed to set up chat client")?;
    let can_speak = context.speech.can_speak();
    let mut widget = ChatWidget::new(context);
    if let Some(lang) = &args.lang {
        widget.select_language(lang)?;
    }

    let view = TerminalView::new(can_speak)?;
    conversation_loop(widget, view).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(true, "warn"), "debug");
        assert_eq!(log_directive(false, "warn"), "warn");
        assert_eq!(log_directive(false, "  "), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_configured_level_parses_as_filter() {
        assert!(EnvFilter::try_new(log_directive(false, "debug")).is_ok());
        assert!(EnvFilter::try_new(log_directive(false, &ParleyConfig::default().log_level)).is_ok());
    }
}
