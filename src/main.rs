use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod gemini;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;
use config::Config;
use gemini::GeminiClient;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    // Configuration problems are reported here, before the terminal is
    // taken over and before any request could be issued.
    let config = Config::load().unwrap_or_else(|_| Config::default());
    let endpoint = match config.resolve_endpoint() {
        Ok(endpoint) => endpoint,
        Err(err) => {
            // Leave a template behind so the error points at an editable file
            if config.endpoint_url.is_none() && config.credential.is_none() {
                let _ = config.save();
            }
            return Err(err.into());
        }
    };
    let client = GeminiClient::new(endpoint)?;

    let mut app = App::new(client);
    let mut events = EventHandler::new();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut app, &mut events, &mut terminal).await;

    tui::restore()?;
    result
}

async fn run(app: &mut App, events: &mut EventHandler, terminal: &mut tui::Tui) -> Result<()> {
    let tx = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event, &tx);
        }
    }

    Ok(())
}

/// Logs go to a file next to the config so diagnostics survive without
/// writing into the alternate screen.
fn init_logging() -> Result<()> {
    let log_dir = config::log_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("gembot.log"))
        .context("Could not create log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
