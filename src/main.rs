use anyhow::{anyhow, Result};
use std::fs;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod app;
mod backend;
mod config;
mod format;
mod handler;
mod transcript;
mod tui;
mod ui;

use app::App;
use backend::BackendClient;
use config::Config;
use transcript::Message;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::load()?;
    let backend = BackendClient::new(&config.base_url);
    let greeting = Message::bot(&config.greeting_text());
    let mut app = App::new(
        backend,
        greeting,
        config.bot_name.clone(),
        config.docs_url.clone(),
    );

    // Probe backend availability once at startup. The outcome is observed by
    // the event loop, so the chat is usable while the probe is in flight.
    let probe_backend = app.backend.clone();
    app.pending_probe = Some(tokio::spawn(async move { probe_backend.status().await }));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut tui::EventHandler) -> Result<()> {
    loop {
        observe_pending(app).await;
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Observe finished backend tasks. Tick events arrive every
/// `tui::TICK_INTERVAL`, so a completed reply or probe is picked up within
/// one beat.
async fn observe_pending(app: &mut App) {
    if app.pending_reply.as_ref().is_some_and(|task| task.is_finished()) {
        if let Some(task) = app.pending_reply.take() {
            let outcome = task
                .await
                .unwrap_or_else(|e| Err(anyhow!("chat task failed: {e}")));
            app.finish_exchange(outcome);
        }
    }

    if app.pending_probe.as_ref().is_some_and(|task| task.is_finished()) {
        if let Some(task) = app.pending_probe.take() {
            let outcome = task
                .await
                .unwrap_or_else(|e| Err(anyhow!("probe task failed: {e}")));
            app.apply_probe(outcome);
        }
    }
}

/// Diagnostics go to a file; stdout and stderr belong to the terminal UI.
fn init_logging() {
    let Some(data_dir) = dirs::data_dir() else {
        return;
    };
    let log_dir = data_dir.join("deskchat");
    if fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(file) = fs::File::create(log_dir.join("deskchat.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}
