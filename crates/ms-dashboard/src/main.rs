mod actions;
mod app;
mod config;
mod interaction;
mod poller;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::{App, KeyCommand};
use clap::Parser;
use config::{parse_bool_flag, Args, Config};
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use interaction::TuiInteraction;
use ms_client::{probe_api_variant, CommandFacade, StreamApiClient};
use ms_core::Dashboard;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::OpenOptions,
    io::{self, Stdout},
    path::Path,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const REDRAW_INTERVAL_MS: u64 = 250;
const POLL_EVENT_CAPACITY: usize = 64;
const ACTION_CAPACITY: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::resolve(Args::parse()).context("invalid configuration")?;
    init_logging(config.log_file.as_deref())?;

    let client = StreamApiClient::new(&config.base_url, config.request_timeout)
        .context("failed to build HTTP client")?;
    let variant = match config.api.forced() {
        Some(variant) => {
            info!(event = "api_forced", variant = %variant);
            variant
        }
        None => probe_api_variant(&client).await,
    };
    info!(
        event = "dashboard_start",
        base_url = %config.base_url,
        variant = %variant,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        ordering = ?config.ordering
    );

    let control = Arc::new(CommandFacade::new(client.clone(), variant));
    let (poll_tx, mut poll_rx) = mpsc::channel(POLL_EVENT_CAPACITY);
    let (refresh_tx, refresh_rx) = mpsc::channel(1);
    let (interaction_tx, mut interaction_rx) = mpsc::channel(ACTION_CAPACITY);
    let (outcome_tx, mut outcome_rx) = mpsc::channel(ACTION_CAPACITY);
    let interaction = Arc::new(TuiInteraction::new(interaction_tx));

    tokio::spawn(poller::run_poller(
        client,
        config.poll_interval,
        poll_tx,
        refresh_rx,
    ));

    let mut app = App::new(
        Dashboard::new(config.thresholds, config.ordering),
        variant,
        config.base_url.clone(),
    );

    let mut terminal = setup_terminal()?;
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(REDRAW_INTERVAL_MS));

    let result = async {
        loop {
            terminal.draw(|frame| ui::render(frame, &mut app, chrono::Local::now()))?;
            tokio::select! {
                _ = redraw.tick() => {}
                Some(event) = poll_rx.recv() => {
                    app.apply_poll_event(event, Instant::now());
                }
                Some(request) = interaction_rx.recv() => {
                    app.open_request(request);
                }
                Some(outcome) = outcome_rx.recv() => {
                    if app.apply_outcome(outcome, Instant::now()) {
                        request_refresh(&refresh_tx);
                    }
                }
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => match app.handle_key(key) {
                            KeyCommand::Quit => break,
                            KeyCommand::Refresh => request_refresh(&refresh_tx),
                            KeyCommand::Run(action) => {
                                let interaction = Arc::clone(&interaction);
                                let control = Arc::clone(&control);
                                let outcome_tx = outcome_tx.clone();
                                tokio::spawn(async move {
                                    let outcome = actions::run_action(
                                        action,
                                        interaction.as_ref(),
                                        control.as_ref(),
                                    )
                                    .await;
                                    let _ = outcome_tx.send(outcome).await;
                                });
                            }
                            KeyCommand::None => {}
                        },
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(event = "terminal_event_error", error = %err);
                        }
                        None => break,
                    }
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    restore_terminal(&mut terminal)?;
    info!(event = "dashboard_stop", polls = app.polls_received);
    result
}

fn request_refresh(refresh_tx: &mpsc::Sender<()>) {
    // A full channel already holds a pending refresh.
    let _ = refresh_tx.try_send(());
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_enabled = std::env::var("MS_LOG_STDERR")
        .ok()
        .and_then(|value| parse_bool_flag(&value))
        .unwrap_or(false);

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else if stderr_enabled {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
    Ok(())
}
