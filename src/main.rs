use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use groq_agent::controller::{self, Outcome};
use groq_agent::tui::{self, EventHandler, TerminalSession};
use groq_agent::{handler, ui, App, ChatState, Config, GroqClient, KeySources};

#[derive(Parser)]
#[command(name = "groq-agent")]
#[command(version, about = "Chat with a Groq-hosted model from the terminal")]
struct Cli {
    /// Start with the demonstration conversation already loaded
    #[arg(long)]
    test: bool,
    /// Chat-completion URL (defaults to Groq's public endpoint)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the reply
    Ask {
        /// The question to send
        prompt: String,
    },
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("groq_agent=info"))
}

/// The TUI owns the terminal, so logs go to a file instead of stderr.
fn init_file_logging() {
    let Some(dir) = dirs::data_local_dir().map(|d| d.join("groq-agent")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(dir.join("groq-agent.log")) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Ask { .. }) => init_stderr_logging(),
        None => init_file_logging(),
    }

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable config file");
        Config::default()
    });

    let resolved = KeySources::from_environment(&config).resolve();
    match &resolved {
        Some((source, _)) => info!(source = source.as_str(), "API key found"),
        None => info!("no API key configured"),
    }
    let (key_source, api_key) = match resolved {
        Some((source, key)) => (Some(source), key),
        None => (None, String::new()),
    };

    let client = match cli.endpoint.as_deref().or(config.endpoint.as_deref()) {
        Some(endpoint) => GroqClient::with_endpoint(endpoint),
        None => GroqClient::new(),
    };

    let mut state = ChatState::new(api_key);

    if let Some(Commands::Ask { prompt }) = cli.command {
        state.set_prompt(prompt);
        return match controller::submit(&mut state, &client).await {
            Outcome::Replied => {
                if let Some(turn) = state.turns().last() {
                    println!("{}", turn.content);
                }
                Ok(())
            }
            Outcome::Ignored => bail!("prompt is empty"),
            Outcome::Failed(e) => bail!(e),
        };
    }

    if cli.test {
        state.inject_demo_turns();
    }

    let mut app = App::new(state, key_source, client);
    if cli.test {
        app.scroll_chat_to_bottom();
    }

    tui::install_panic_hook();
    let mut session = TerminalSession::enter()?;
    info!(endpoint = app.client.endpoint(), "terminal UI started");

    run_app(&mut session, &mut app).await
}

async fn run_app(session: &mut TerminalSession, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        session.terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }

        if let Some(outcome) = app.poll_query_task().await {
            info!(?outcome, "request finished");
        }
    }

    Ok(())
}
