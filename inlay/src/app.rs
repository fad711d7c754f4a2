//! Central application state for inlay.
//!
//! Owns the document, the inline chat contribution attached to it and all UI
//! state (mode, scroll, layout caches from the previous frame). The render
//! module reads it, the keybinding dispatcher mutates it, and the main loop
//! feeds it engine and widget events.

use std::sync::Arc;
use std::time::Duration;

use inlay_core::{
    ChatStatus, ContextMenu, EditorEvent, EditorSurface, EngineEvent, InlineChatContribution,
    WidgetEvent,
};
use ratatui::layout::Rect;
use tokio::time::Instant;

use crate::config::LivePreferences;
use crate::document::Document;
use crate::menu::{MenuItem, TerminalMenu};
use crate::widgets::TuiWidgetFactory;

/// How long a status-bar message stays up.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(4);

pub type Chat = InlineChatContribution<TuiWidgetFactory, TerminalMenu>;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Navigation, selection and inline chat keys (default).
    #[default]
    Normal,
    /// Typing edits the buffer.
    Insert,
    /// Full-screen help overlay is shown above the buffer.
    HelpOverlay,
    /// Quit-confirmation dialog shown when the buffer has unsaved edits.
    ConfirmQuit,
    /// The right-click menu has keyboard focus.
    Menu,
}

/// What a click inside the chat widget hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatHit {
    Action(String),
    Accept,
    Regenerate,
    Discard,
}

/// One screen row of the buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    /// A document line (1-based).
    Text(u32),
    /// A row of the diff zone (0-based within the zone).
    Diff(u32),
}

pub struct AppState {
    pub mode: Mode,
    pub document: Document,
    pub chat: Chat,
    pub preferences: Arc<LivePreferences>,

    /// First visual row shown in the buffer view.
    pub scroll: usize,
    /// Visual rows of the last frame, for mouse mapping.
    pub rows: Vec<Row>,
    /// Buffer area of the last frame (no status bar).
    pub editor_area: Rect,
    /// Gutter width of the last frame, in columns.
    pub gutter_width: u16,
    /// Chat widget area and its clickable parts, from the last frame.
    pub chat_area: Rect,
    pub chat_hitboxes: Vec<(Rect, ChatHit)>,

    pub help_scroll: u16,
    /// Keep the cursor row on screen at the next render. Cleared by wheel
    /// scrolling so the view can move away from the cursor.
    pub follow_cursor: bool,
    /// Left button went down over the buffer and is still held.
    pub dragging: bool,
    /// Left button went down over the chat widget and is still held.
    pub pressed_on_chat: bool,

    status_message: Option<(String, Instant)>,
}

impl AppState {
    pub fn new(document: Document, chat: Chat, preferences: Arc<LivePreferences>) -> Self {
        Self {
            mode: Mode::default(),
            document,
            chat,
            preferences,
            scroll: 0,
            rows: Vec::new(),
            editor_area: Rect::default(),
            gutter_width: 0,
            chat_area: Rect::default(),
            chat_hitboxes: Vec::new(),
            help_scroll: 0,
            follow_cursor: true,
            dragging: false,
            pressed_on_chat: false,
            status_message: None,
        }
    }

    // -----------------------------------------------------------------------
    // Inline chat plumbing
    // -----------------------------------------------------------------------

    pub fn editor_event(&mut self, event: EditorEvent) {
        self.chat.handle_editor_event(&mut self.document, event, Instant::now());
        self.sync_menu_mode();
    }

    pub fn widget_event(&mut self, event: WidgetEvent) {
        self.chat.handle_widget_event(&mut self.document, event);
    }

    pub fn engine_event(&mut self, event: EngineEvent) {
        let was_thinking = self.chat.status() == ChatStatus::Thinking;
        self.chat.handle_engine_event(&mut self.document, event);
        if was_thinking && self.chat.status() == ChatStatus::Error {
            self.notify("inline chat request failed (see .inlay/inlay.log)");
        }
    }

    /// Fires the debounced trigger if it is due.
    pub fn poll_trigger(&mut self) {
        self.chat.poll_trigger(&mut self.document, Instant::now());
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.chat.next_deadline()
    }

    /// Opens the chat for the current selection, bypassing the debounce gate.
    pub fn show_inline_chat(&mut self) {
        if !self.chat.is_attached() {
            self.notify("inline chat needs a file on disk");
            return;
        }
        self.chat.set_inline_chat_visible(&mut self.document, true);
        if self.chat.widgets().session().is_none() {
            self.notify("select some code first");
        }
    }

    pub fn close_inline_chat(&mut self) {
        self.chat.set_inline_chat_visible(&mut self.document, false);
    }

    pub fn chat_open(&self) -> bool {
        self.chat.widgets().session().is_some()
    }

    pub fn toggle_auto_show(&mut self) {
        let on = self.preferences.toggle_auto_show();
        self.notify(if on { "inline chat auto-show on" } else { "inline chat auto-show off" });
    }

    /// Runs `f` against the document and reports a selection change to the
    /// engine if the selection moved.
    pub fn with_selection<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> R {
        let before = self.document.selection();
        let out = f(&mut self.document);
        self.follow_cursor = true;
        if self.document.selection() != before {
            self.editor_event(EditorEvent::SelectionChanged);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Menu
    // -----------------------------------------------------------------------

    pub fn open_menu(&mut self, column: u16, row: u16) {
        self.chat.context_menu_mut().open(ratatui::layout::Position::new(column, row));
        self.mode = Mode::Menu;
    }

    pub fn dismiss_menu(&mut self) {
        self.chat.context_menu_mut().hide(false);
        self.sync_menu_mode();
    }

    /// Leaves menu mode once something else closed the menu.
    pub fn sync_menu_mode(&mut self) {
        if self.mode == Mode::Menu && !self.chat.context_menu().is_open() {
            self.mode = Mode::Normal;
        }
    }

    /// Runs a menu entry after the menu has closed.
    pub fn run_menu_item(&mut self, item: MenuItem) {
        self.sync_menu_mode();
        match item {
            MenuItem::InlineChat => self.show_inline_chat(),
            MenuItem::Undo => self.undo(),
            MenuItem::Save => self.save(),
        }
    }

    // -----------------------------------------------------------------------
    // Document commands
    // -----------------------------------------------------------------------

    pub fn undo(&mut self) {
        if self.chat_open() {
            self.close_inline_chat();
        }
        if !self.with_selection(Document::undo) {
            self.notify("nothing to undo");
        }
    }

    pub fn save(&mut self) {
        match self.document.save() {
            Ok(()) => self.notify(format!("saved {}", self.document.display_name())),
            Err(error) => {
                tracing::warn!(%error, "save failed");
                self.notify(format!("save failed: {error}"));
            }
        }
    }

    /// Re-reads the file from disk, discarding unsaved edits.
    pub fn reload(&mut self) {
        let Some(path) = self.document.path().map(ToOwned::to_owned) else {
            self.notify("scratch buffer has nothing to reload");
            return;
        };
        match Document::open(&path) {
            Ok(document) => {
                self.document = document;
                self.scroll = 0;
                self.editor_event(EditorEvent::ModelChanged);
                self.notify(format!("reloaded {}", path.display()));
            }
            Err(error) => self.notify(format!("reload failed: {error}")),
        }
    }

    /// Replaces the selection (or inserts at the cursor). Typing over an open
    /// chat session closes it first so its ranges never go stale.
    pub fn type_text(&mut self, text: &str) {
        if self.chat_open() {
            self.close_inline_chat();
        }
        self.with_selection(|doc| doc.insert(text));
    }

    pub fn delete_backward(&mut self) {
        if self.chat_open() {
            self.close_inline_chat();
        }
        self.with_selection(Document::backspace);
    }

    pub fn delete_forward(&mut self) {
        if self.chat_open() {
            self.close_inline_chat();
        }
        self.with_selection(Document::delete);
    }

    // -----------------------------------------------------------------------
    // Scrolling
    // -----------------------------------------------------------------------

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.rows.len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
        self.follow_cursor = false;
        self.editor_event(EditorEvent::ScrollChanged);
    }

    /// Visible buffer rows in the last frame.
    pub fn viewport_rows(&self) -> usize {
        self.editor_area.height as usize
    }

    /// Maps a screen cell to a document position, if it lands on a text row.
    pub fn position_at(&self, column: u16, row: u16) -> Option<inlay_core::TextPosition> {
        let area = self.editor_area;
        if row < area.y || row >= area.y + area.height || column < area.x {
            return None;
        }
        let visual = self.scroll + (row - area.y) as usize;
        let Row::Text(line) = *self.rows.get(visual)? else {
            return None;
        };
        let text_x = column.saturating_sub(area.x + self.gutter_width);
        Some(inlay_core::TextPosition::new(line, u32::from(text_x) + 1))
    }

    // -----------------------------------------------------------------------
    // Status messages
    // -----------------------------------------------------------------------

    pub fn notify(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_ref().map(|(m, _)| m.as_str())
    }

    /// Tick housekeeping: expires the status message.
    pub fn on_tick(&mut self) {
        if self
            .status_message
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() >= STATUS_MESSAGE_TTL)
        {
            self.status_message = None;
        }
    }

    /// Tears down the inline chat before exit: cancels any pending request
    /// and restores hidden lines.
    pub fn shutdown(mut self) {
        self.chat.dispose(&mut self.document);
    }
}
