mod app;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use app::App;
use casecards::api::GeneratorClient;
use casecards::cli::Cli;
use casecards::config;
use casecards::conversation::{exchange, ConversationController, ExchangeOutcome};
use casecards::events::{AppEvent, ChannelSurface};
use casecards::logging;
use casecards::models::AppConfig;
use casecards::surface::RecordingSurface;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = config::load_config()?;
    if let Some(server) = &cli.server {
        config.server_url.clone_from(server);
    }

    let client = GeneratorClient::new(&config.server_url, config.connect_timeout_secs)
        .context("Failed to create generator client")?;

    if let Some(prompt) = &cli.once {
        logging::init_stderr_logging(cli.debug);
        return Ok(run_once(&client, &config, prompt).await);
    }

    logging::init_file_logging(&config::get_log_path()?, cli.debug)?;
    info!(server = %client.base_url(), "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.max_input_chars);
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let probe = spawn_health_probe(
        client.clone(),
        Duration::from_secs(config.health_interval_secs.max(1)),
        tx.clone(),
    );

    let res = run_app(&mut terminal, &mut app, &client, &tx, &mut rx);
    probe.abort();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// One exchange without the terminal UI. The final markup goes to stdout.
async fn run_once(client: &GeneratorClient, config: &AppConfig, prompt: &str) -> ExitCode {
    let mut controller = ConversationController::new(config.max_input_chars);
    let mut surface = RecordingSurface::new();

    let outcome = match controller.run(client, prompt, &mut surface).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::from(2);
        }
    };

    if let Some(document) = surface.last_document() {
        println!("{}", document.markup());
    }

    match outcome {
        ExchangeOutcome::Completed => ExitCode::SUCCESS,
        ExchangeOutcome::Failed(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn spawn_health_probe(
    client: GeneratorClient,
    interval: Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // The first tick fires immediately
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let report = client.health_check().await;
            if tx.send(AppEvent::Health(report)).is_err() {
                break;
            }
        }
    })
}

fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Surface(update) => update.apply(&mut app.view),
        AppEvent::ExchangeFinished(outcome) => {
            app.controller.finish(outcome, &mut app.view);
            app.view.scroll_to_bottom();
        }
        AppEvent::Health(report) => app.health = Some(report),
    }
}

fn send_message(
    app: &mut App,
    client: &GeneratorClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> Option<JoinHandle<()>> {
    let prompt = match app.controller.submit(&app.input_buffer, &mut app.view) {
        Ok(prompt) => prompt,
        Err(err) => {
            app.notice = Some(err.to_string());
            return None;
        }
    };

    app.input_buffer.clear();
    app.notice = None;
    app.selected_card = None;
    app.copied = None;

    let client = client.clone();
    let tx = event_tx.clone();

    Some(tokio::spawn(async move {
        let mut surface = ChannelSurface::new(tx.clone());
        let outcome = exchange(&client, &prompt, &mut surface).await;
        let _ = tx.send(AppEvent::ExchangeFinished(outcome));
    }))
}

/// Keys that apply while an overlay or the exit prompt is active.
/// Returns true when the key was consumed.
fn handle_modal_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            true
        }
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
            true
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            true
        }
        KeyCode::Esc if app.exit_pending => {
            app.exit_pending = false;
            true
        }
        _ if app.show_help => true,
        _ => {
            // Any other key cancels a pending exit and is then handled normally
            app.exit_pending = false;
            false
        }
    }
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    client: &GeneratorClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    if handle_modal_keys(app, key, modifiers) {
        return;
    }

    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match key {
        KeyCode::Char('q') if ctrl => app.quit(),
        KeyCode::Char('e') if ctrl => app.load_next_example(),
        KeyCode::Char('y') if ctrl => {
            app.copy_selected_card();
        }
        KeyCode::Up if ctrl => app.select_previous_card(),
        KeyCode::Down if ctrl => app.select_next_card(),

        KeyCode::Up => app.view.scroll_up(1),
        KeyCode::Down => app.view.scroll_down(1),
        KeyCode::PageUp => app.view.scroll_up(10),
        KeyCode::PageDown => app.view.scroll_down(10),
        KeyCode::Home => app.view.scroll_to_top(),
        KeyCode::End => app.view.scroll_to_bottom(),

        KeyCode::Enter if modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) => {
            app.input_buffer.push('\n');
        }
        KeyCode::Enter => {
            // The task runs to its own terminal event; the handle is not kept
            let _ = send_message(app, client, event_tx);
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
            app.notice = None;
        }
        KeyCode::Char(c) if !ctrl => {
            app.input_buffer.push(c);
            app.notice = None;
        }
        _ => {}
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &GeneratorClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Apply everything the background tasks produced, in order
        while let Ok(app_event) = event_rx.try_recv() {
            handle_app_event(app, app_event);
        }

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_keyboard_input(app, key.code, key.modifiers, client, event_tx);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
