//! Per-editor entry point tying the watcher, status machine, widget manager and
//! orchestrator together.
//!
//! The host owns one [`InlineChatContribution`] per editor and forwards three
//! event streams into it from its event loop: editor activity, widget
//! reactions and engine completions. Every handler runs to completion
//! synchronously; the only suspended work is the spawned strategy call.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc::UnboundedSender, watch};
use tokio::time::Instant;

use crate::debounce::DEFAULT_DEBOUNCE;
use crate::editor::{Capabilities, ContextMenu, EditorEvent, EditorSurface, PreferenceSource};
use crate::error::InlineChatError;
use crate::orchestrator::{DiffPreviewOrchestrator, EngineEvent, DEFAULT_OVERFLOW_PADDING};
use crate::registry::FeatureRegistry;
use crate::status::ChatStatusMachine;
use crate::text::expand_to_lines;
use crate::types::{ChatStatus, SessionId};
use crate::watcher::{TriggerWatcher, WatcherReaction};
use crate::widgets::{DiffWiring, WidgetFactory, WidgetLifecycleManager};

/// Reactions coming from the chat widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// An action in the content widget was clicked.
    ActionClicked(String),
    Accept,
    Regenerate,
    Discard,
    /// The diff widget grew this many lines past its height limit.
    DiffOverflow(u32),
}

/// Host-provided services shared by every editor.
#[derive(Clone)]
pub struct InlineChatServices {
    pub capabilities: Capabilities,
    pub registry: Arc<FeatureRegistry>,
    pub preferences: Arc<dyn PreferenceSource + Send + Sync>,
}

/// Tunables for one contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineChatOptions {
    /// Trailing-edge window for selection/mouse-up triggers.
    pub debounce: Duration,
    /// Padding added when nudging the content widget below an overflowing diff.
    pub overflow_padding: u32,
}

impl Default for InlineChatOptions {
    fn default() -> Self {
        Self { debounce: DEFAULT_DEBOUNCE, overflow_padding: DEFAULT_OVERFLOW_PADDING }
    }
}

pub struct InlineChatContribution<F: WidgetFactory, M: ContextMenu> {
    attached: bool,
    services: InlineChatServices,
    menu: M,
    manager: WidgetLifecycleManager<F>,
    status: ChatStatusMachine,
    watcher: TriggerWatcher,
    orchestrator: DiffPreviewOrchestrator,
    notifications: broadcast::Sender<WidgetEvent>,
}

impl<F: WidgetFactory, M: ContextMenu> InlineChatContribution<F, M> {
    /// Attaches inline chat to `editor`.
    ///
    /// An editor already showing a non-`file` document gets a detached
    /// contribution that ignores every event. `events` is where spawned
    /// strategy calls and deferred resets report back; the host must feed what
    /// arrives there into [`handle_engine_event`](Self::handle_engine_event).
    pub fn contribute(
        editor: &dyn EditorSurface,
        services: InlineChatServices,
        factory: F,
        menu: M,
        events: UnboundedSender<EngineEvent>,
        options: InlineChatOptions,
    ) -> Self {
        let attached = editor.uri().is_none_or(|uri| uri.is_file());
        if !attached {
            tracing::debug!("inline chat not attached to non-file document");
        }
        let (notifications, _) = broadcast::channel(16);
        Self {
            attached,
            services,
            menu,
            manager: WidgetLifecycleManager::new(factory),
            status: ChatStatusMachine::new(),
            watcher: TriggerWatcher::new(options.debounce),
            orchestrator: DiffPreviewOrchestrator::new(events, options.overflow_padding),
            notifications,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn handle_editor_event(
        &mut self,
        editor: &mut dyn EditorSurface,
        event: EditorEvent,
        now: Instant,
    ) {
        if !self.attached {
            return;
        }
        match self.watcher.observe(event, now) {
            WatcherReaction::Nothing => {}
            WatcherReaction::ResetAll => self.reset(editor),
            WatcherReaction::HideContextMenu => {
                self.menu.clear_on_hidden();
                self.menu.hide(true);
            }
        }
    }

    /// When the host should call [`poll_trigger`](Self::poll_trigger) next.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.attached {
            self.watcher.deadline()
        } else {
            None
        }
    }

    /// Fires the debounced trigger edge if it is due.
    pub fn poll_trigger(&mut self, editor: &mut dyn EditorSurface, now: Instant) {
        if !self.attached {
            return;
        }
        let auto_show = self.services.preferences.auto_show_inline_chat();
        if self.watcher.poll(now, auto_show, self.status.current()) {
            self.trigger(editor);
        }
    }

    /// External "inline chat visible" signal: `true` opens the affordance for
    /// the current selection straight away, `false` closes everything.
    pub fn set_inline_chat_visible(&mut self, editor: &mut dyn EditorSurface, visible: bool) {
        if !self.attached {
            return;
        }
        if visible {
            self.trigger(editor);
        } else {
            self.reset(editor);
        }
    }

    /// Runs the trigger procedure. Returns the new session on success.
    pub fn trigger(&mut self, editor: &mut dyn EditorSurface) -> Option<SessionId> {
        let registry = Arc::clone(&self.services.registry);
        self.manager.open_content_widget(
            editor,
            self.services.capabilities,
            &self.status,
            registry.actions(),
        )
    }

    pub fn handle_widget_event(&mut self, editor: &mut dyn EditorSurface, event: WidgetEvent) {
        if !self.attached {
            return;
        }
        // Nobody listening is fine.
        let _ = self.notifications.send(event.clone());

        let result = match event {
            WidgetEvent::ActionClicked(id) => self.run_action(editor, &id),
            WidgetEvent::Accept => self
                .orchestrator
                .accept(editor, &mut self.manager, &self.status)
                .map(|_| ()),
            WidgetEvent::Regenerate => self
                .orchestrator
                .regenerate(editor, &mut self.manager, &self.status)
                .map(|_| ()),
            WidgetEvent::Discard => {
                if self.manager.session().is_some() {
                    self.reset(editor);
                }
                Ok(())
            }
            WidgetEvent::DiffOverflow(lines) => {
                self.orchestrator.nudge_for_overflow(editor, &mut self.manager, lines);
                Ok(())
            }
        };
        if let Err(error) = result {
            tracing::debug!(%error, "widget event not applied");
        }
    }

    pub fn handle_engine_event(&mut self, editor: &mut dyn EditorSurface, event: EngineEvent) {
        match event {
            EngineEvent::StrategyFinished { ticket, response } => {
                let result = self.orchestrator.complete(
                    editor,
                    &mut self.manager,
                    &self.status,
                    ticket,
                    response,
                );
                if let Err(error) = result {
                    tracing::debug!(%error, "strategy result not applied");
                }
            }
            EngineEvent::IdleReset { session } => {
                if self.manager.session_id() == Some(session) {
                    self.reset(editor);
                }
            }
        }
    }

    fn run_action(&mut self, editor: &mut dyn EditorSurface, id: &str) -> Result<(), InlineChatError> {
        let Some(selection) = self.manager.session().map(|s| s.selection) else {
            return Ok(());
        };
        if self.status.current() == ChatStatus::Thinking {
            tracing::debug!(action = id, "action ignored while a request is in flight");
            return Ok(());
        }
        let registry = Arc::clone(&self.services.registry);
        let (Some(handler), Some(action)) = (registry.handler(id), registry.action(id)) else {
            tracing::debug!(action = id, "unknown inline chat action");
            return Ok(());
        };
        tracing::info!(action = %action.id, "inline chat action");

        if let Some(execute) = &handler.execute {
            execute(&mut *editor);
            self.reset(editor);
        }

        if let Some(strategy) = &handler.diff_preview {
            let wiring = DiffWiring {
                action_id: action.id.clone(),
                strategy: Arc::clone(strategy),
                cross_selection: expand_to_lines(selection),
            };
            // An execute step above may already have closed the session.
            let Some(session) = self.manager.session_mut() else {
                return Ok(());
            };
            session.wiring = Some(wiring.clone());
            self.orchestrator.run(editor, &mut self.manager, &self.status, &wiring)?;
        }
        Ok(())
    }

    /// Full teardown: widgets, scopes, token, and status back to READY.
    pub fn reset(&mut self, editor: &mut dyn EditorSurface) {
        self.manager.reset_all(editor);
        self.status.reset();
    }

    /// Detaches from `editor`, releasing everything this contribution owns.
    pub fn dispose(mut self, editor: &mut dyn EditorSurface) {
        self.reset(editor);
        self.attached = false;
    }

    pub fn status(&self) -> ChatStatus {
        self.status.current()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ChatStatus> {
        self.status.subscribe()
    }

    /// Widget reactions re-exposed to other components.
    pub fn subscribe_widget_events(&self) -> broadcast::Receiver<WidgetEvent> {
        self.notifications.subscribe()
    }

    pub fn widgets(&self) -> &WidgetLifecycleManager<F> {
        &self.manager
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetLifecycleManager<F> {
        &mut self.manager
    }

    pub fn context_menu(&self) -> &M {
        &self.menu
    }

    pub fn context_menu_mut(&mut self) -> &mut M {
        &mut self.menu
    }

    pub fn services(&self) -> &InlineChatServices {
        &self.services
    }
}
