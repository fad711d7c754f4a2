//! inlay: a terminal editor with inline AI chat on the selection.
//!
//! Entry point for the `inlay` binary. Wires together the terminal lifecycle
//! (`tui`), the unified event bus (`event`), the document buffer, the inline
//! chat engine from `inlay-core` and its terminal widgets, and the UI.
//!
//! # Startup sequence
//!
//! 1. Tracing to `.inlay/inlay.log`, filtered by `INLAY_LOG` (default `info`).
//!    The terminal belongs to the TUI, so nothing is logged to it.
//! 2. Config, theme and the syntax sets: read-only, safe before terminal init.
//! 3. Open the document and attach the inline chat contribution.
//! 4. `install_panic_hook()` then `register_sigterm()`.
//! 5. `init_tui()`, then spawn the terminal event task.
//!
//! `restore_tui()` runs after the event loop returns, whether it returned on
//! quit, SIGTERM, channel close or a draw error.

mod app;
mod config;
mod document;
mod event;
mod highlight;
mod menu;
mod strategy;
mod theme;
mod tui;
mod ui;
mod widgets;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use inlay_core::{InlineChatContribution, InlineChatServices};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::event::AppEvent;
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

const LOG_DIR: &str = ".inlay";

/// SIGTERM is checked at least this often, even when no events arrive.
const HEARTBEAT: Duration = Duration::from_millis(50);

/// Appends structured logs to `.inlay/inlay.log`.
///
/// A subscriber that is already installed wins; that only happens in tests.
fn init_tracing() -> std::io::Result<()> {
    std::fs::create_dir_all(LOG_DIR)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(LOG_DIR).join("inlay.log"))?;
    let filter = EnvFilter::try_from_env("INLAY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(true);
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing()?;

    let config = config::load();
    let theme = theme::Theme::from_name(&config.theme);
    highlight::warm_up();

    let document = match std::env::args_os().nth(1) {
        Some(path) => document::Document::open(Path::new(&path))?,
        None => document::Document::scratch(),
    };
    tracing::info!(file = %document.display_name(), "starting");

    let actions = if config.inline_chat.actions.is_empty() {
        strategy::default_actions()
    } else {
        config.inline_chat.actions.clone()
    };
    let preferences = Arc::new(config::LivePreferences::new(config.inline_chat.auto_visible));
    let services = InlineChatServices {
        capabilities: config.inline_chat.capabilities(),
        registry: strategy::build_registry(&actions),
        preferences: preferences.clone(),
    };

    let handler = event::EventHandler::new();
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    event::spawn_engine_bridge(engine_rx, handler.tx.clone());

    let factory = widgets::TuiWidgetFactory::new(
        theme.clone(),
        config.inline_chat.max_diff_height,
        handler.tx.clone(),
    );
    let menu = menu::TerminalMenu::new(handler.tx.clone());
    let chat = InlineChatContribution::contribute(
        &document,
        services,
        factory,
        menu,
        engine_tx,
        config.inline_chat.options(),
    );
    let mut state = AppState::new(document, chat, preferences);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;

    let mut terminal = tui::init_tui()?;
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let outcome = run(&mut terminal, &mut state, &mut rx, &term_flag, &theme).await;

    tui::restore_tui()?;
    state.shutdown();
    if let Err(error) = &outcome {
        tracing::error!(%error, "event loop failed");
    }
    tracing::info!("exiting");
    outcome
}

/// The event loop. Returns on quit, SIGTERM or channel close; a failed draw
/// is the only error.
async fn run(
    terminal: &mut tui::Tui,
    state: &mut AppState,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    term_flag: &AtomicBool,
    theme: &theme::Theme,
) -> std::io::Result<()> {
    loop {
        let deadline = state.next_deadline();
        let trigger_due = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(HEARTBEAT) => {}
            _ = trigger_due => state.poll_trigger(),
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    return Ok(());
                };
                match event {
                    AppEvent::Render => {
                        terminal.draw(|frame| ui::render(frame, state, theme))?;
                    }
                    AppEvent::Key(key) => {
                        if handle_key(key, state) == KeyAction::Quit {
                            return Ok(());
                        }
                    }
                    AppEvent::Mouse(mouse) => {
                        if handle_mouse(mouse, state) == KeyAction::Quit {
                            return Ok(());
                        }
                    }
                    // frame.area() picks up the new size on the next Render.
                    AppEvent::Resize(_, _) => {}
                    AppEvent::Tick => state.on_tick(),
                    AppEvent::Engine(event) => state.engine_event(event),
                    AppEvent::Widget(event) => state.widget_event(event),
                    AppEvent::Menu(item) => state.run_menu_item(item),
                    AppEvent::Quit => return Ok(()),
                }
            }
        }

        if term_flag.load(Ordering::Relaxed) {
            tracing::info!("SIGTERM received");
            return Ok(());
        }
    }
}
