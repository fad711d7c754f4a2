//! Event bus for inlay.
//!
//! Terminal input, timer ticks, inline chat engine completions and widget
//! signals are all normalised into one `AppEvent` enum and sent over a tokio
//! unbounded MPSC channel. The main loop receives from this channel and
//! dispatches accordingly.
//!
//! Two independent intervals drive the render and logic cycles:
//! - **Render interval** (33 ms ≈ 30 FPS) - triggers a `terminal.draw()` call.
//! - **Tick interval** (250 ms = 4 Hz) - housekeeping (status message expiry).
//!
//! The inline chat debounce does not ride on either interval: the main loop
//! sleeps until the contribution's own deadline instead.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use inlay_core::{EngineEvent, WidgetEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::menu::MenuItem;

/// All events the application can receive from any source.
#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    Key(KeyEvent),
    /// A mouse event from the terminal (click, drag, scroll).
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// Logic tick (4 Hz / 250 ms).
    Tick,
    /// Render tick - triggers a `terminal.draw()` call (≈30 FPS / 33 ms).
    Render,
    /// A strategy finished or the engine scheduled a deferred reset.
    Engine(EngineEvent),
    /// A chat widget raised a reaction on its own (diff overflow).
    Widget(WidgetEvent),
    /// A context menu entry was picked; runs once the menu has closed.
    Menu(MenuItem),
    /// Quit signal.
    Quit,
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned and handed to the event task, the widget
/// factory and the context menu; the receiver (`rx`) is owned by the main loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards engine events from the inline chat contribution onto the bus.
///
/// The contribution reports on its own channel so the engine stays unaware of
/// `AppEvent`; this task is the bridge. It ends when either side closes.
pub fn spawn_engine_bridge(
    mut engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = engine_rx.recv().await {
            if tx.send(AppEvent::Engine(event)).is_err() {
                break;
            }
        }
    });
}

/// Spawns the background tokio task that drives the terminal side of the bus.
///
/// # Key implementation choices
///
/// - `reader.next().fuse()` - if the crossterm stream terminates unexpectedly,
///   `tokio::select!` must not keep polling a completed future.
/// - `KeyEventKind::Press` filter - Windows fires both `Press` and `Release`
///   for every keystroke.
/// - Send errors end the task: the receiver is gone, nobody is listening.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            let sent = tokio::select! {
                _ = tick_tick => tx.send(AppEvent::Tick),
                _ = render_tick => tx.send(AppEvent::Render),
                maybe_event = crossterm_event => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        tx.send(AppEvent::Key(key))
                    }
                    Some(Ok(Event::Resize(w, h))) => tx.send(AppEvent::Resize(w, h)),
                    Some(Ok(Event::Mouse(mouse))) => tx.send(AppEvent::Mouse(mouse)),
                    Some(Err(error)) => {
                        tracing::warn!(%error, "terminal event stream error");
                        Ok(())
                    }
                    None => tx.send(AppEvent::Quit),
                    _ => Ok(()),
                },
            };
            if sent.is_err() {
                break;
            }
        }
    });
}
