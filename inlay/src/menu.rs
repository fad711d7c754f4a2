//! Right-click context menu.
//!
//! Picking an entry does not run it straight away: the entry is parked in the
//! menu's on-hidden hook and posted to the event bus once the menu has
//! actually closed. Scrolling force-closes the menu after clearing the hook,
//! so a pick that raced a scroll is dropped.

use inlay_core::ContextMenu;
use ratatui::layout::{Position, Rect};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    InlineChat,
    Undo,
    Save,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::InlineChat, MenuItem::Undo, MenuItem::Save];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::InlineChat => "Inline chat",
            MenuItem::Undo => "Undo",
            MenuItem::Save => "Save",
        }
    }
}

type HiddenHook = Box<dyn FnOnce() + Send>;

pub struct TerminalMenu {
    open_at: Option<Position>,
    highlighted: usize,
    on_hidden: Option<HiddenHook>,
    events: UnboundedSender<AppEvent>,
    /// Where the menu was drawn last frame, for hit testing.
    pub area: Rect,
}

impl TerminalMenu {
    pub fn new(events: UnboundedSender<AppEvent>) -> Self {
        Self { open_at: None, highlighted: 0, on_hidden: None, events, area: Rect::default() }
    }

    pub fn open(&mut self, at: Position) {
        self.open_at = Some(at);
        self.on_hidden = None;
    }

    pub fn is_open(&self) -> bool {
        self.open_at.is_some()
    }

    pub fn position(&self) -> Option<Position> {
        self.open_at
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Moves the highlight by `delta` entries, wrapping around.
    pub fn move_highlight(&mut self, delta: isize) {
        let len = MenuItem::ALL.len() as isize;
        self.highlighted = (self.highlighted as isize + delta).rem_euclid(len) as usize;
    }

    /// Entry under screen position `pos`, if the menu is open and `pos` is on it.
    pub fn item_at(&self, pos: Position) -> Option<MenuItem> {
        if !self.is_open() || !self.area.contains(pos) {
            return None;
        }
        // One row of border above the first entry.
        let row = pos.y.checked_sub(self.area.y + 1)? as usize;
        MenuItem::ALL.get(row).copied()
    }

    /// Closes the menu and runs `item` once it is closed.
    pub fn choose(&mut self, item: MenuItem) {
        let events = self.events.clone();
        self.on_hidden = Some(Box::new(move || {
            let _ = events.send(AppEvent::Menu(item));
        }));
        self.hide(false);
    }

    pub fn choose_highlighted(&mut self) {
        self.choose(MenuItem::ALL[self.highlighted]);
    }
}

impl ContextMenu for TerminalMenu {
    /// A forced hide also forgets the highlighted entry.
    fn hide(&mut self, force: bool) {
        if self.open_at.take().is_none() {
            return;
        }
        if force {
            self.highlighted = 0;
        }
        self.area = Rect::default();
        if let Some(hook) = self.on_hidden.take() {
            hook();
        }
        tracing::trace!(force, "context menu hidden");
    }

    fn clear_on_hidden(&mut self) {
        self.on_hidden = None;
    }
}
