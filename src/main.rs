use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use smartspark::tui::{self, EventHandler, Tui};
use smartspark::{handler, logging, ui, App, ChatClient, Config, FilePreferences};

#[derive(Parser)]
#[command(name = "smartspark")]
#[command(version, about = "Chat with the SmartSpark assistant from your terminal")]
struct Cli {
    /// Base URL of the chat backend
    #[arg(long, env = "SMARTSPARK_BACKEND_URL")]
    backend_url: Option<String>,

    /// Preferences file (theme)
    #[arg(long)]
    preferences: Option<PathBuf>,

    /// Log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Continue an existing conversation by id
    #[arg(long, value_name = "ID")]
    resume: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::resolve(cli.backend_url, cli.preferences, cli.log_file)?;

    // Logging is best effort; the client works without it
    if let Err(e) = logging::init(&config.log_path) {
        eprintln!("warning: logging disabled: {:#}", e);
    }
    tracing::info!(backend = %config.backend_url, "starting");

    let backend = Arc::new(ChatClient::new(&config.backend_url));
    let preferences = Box::new(FilePreferences::open(&config.preferences_path));
    let mut app = App::new(backend, preferences);

    if let Some(id) = cli.resume.as_deref() {
        app.resume(id)
            .await
            .with_context(|| format!("could not resume conversation {}", id))?;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }

        app.poll_reply().await;
    }

    tracing::info!("exiting");
    Ok(())
}
