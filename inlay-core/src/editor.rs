//! Contracts the engine consumes from its host.
//!
//! The engine never owns an editor. Hosts pass `&mut dyn EditorSurface` into
//! every call that needs one, which keeps the document mutable from the host's
//! own input handling between engine calls.

use crate::types::{DocumentUri, TextRange};

/// Owner tag passed to [`EditorSurface::set_hidden_ranges`] by the engine.
pub const DIFF_HIDDEN_RANGE_OWNER: &str = "inline-chat-diff";

/// The slice of an editor the inline chat engine reads and mutates.
pub trait EditorSurface {
    /// Identity of the shown document, `None` when nothing is open.
    fn uri(&self) -> Option<DocumentUri>;

    /// Whether a text model is attached.
    fn has_model(&self) -> bool;

    /// Current primary selection, `None` when the editor has no cursor.
    fn selection(&self) -> Option<TextRange>;

    /// Text covered by `range`; columns past a line end clamp to the end.
    fn value_in_range(&self, range: TextRange) -> String;

    /// Replaces `range` with `text` as one undoable edit.
    fn push_edit(&mut self, range: TextRange, text: &str);

    fn line_count(&self) -> u32;

    /// Height of one line in the host's layout unit (pixels, rows, ...).
    fn line_height(&self) -> u32;

    /// Replaces the set of ranges `owner` keeps hidden. An empty slice shows
    /// everything again.
    fn set_hidden_ranges(&mut self, ranges: &[TextRange], owner: &'static str);
}

/// Floating context menu that scrolling must close.
pub trait ContextMenu {
    /// Closes the menu. `force` closes it even while it has focus.
    fn hide(&mut self, force: bool);

    /// Drops the callback that would normally run when the menu hides.
    fn clear_on_hidden(&mut self);
}

/// Source of the "auto-show chat on selection" preference.
pub trait PreferenceSource {
    fn auto_show_inline_chat(&self) -> bool;
}

/// Feature capabilities reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub supports_inline_chat: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { supports_inline_chat: true }
    }
}

/// Editor activity the trigger watcher observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// A different document (or none) is now shown.
    ModelChanged,
    /// The cursor or selection moved.
    SelectionChanged,
    MouseDown,
    /// A mouse button was released. `on_chat_widget` is set when the release
    /// landed on the inline chat widget itself.
    MouseUp { on_chat_widget: bool },
    ScrollChanged,
}
