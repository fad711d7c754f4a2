//! UI rendering module for inlay.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`, the
//! buffer in `editor_view.rs`, and the inline chat box and context menu in
//! `chat_view.rs`.

mod chat_view;
mod editor_view;
mod layout;
pub mod help;
pub mod keybindings;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, render_confirm_quit, render_status_bar};

/// Renders one complete frame.
///
/// The buffer goes first because it caches the visual rows that the chat
/// widget anchors to. Overlays follow in stacking order: chat box, status
/// bar, context menu, then any modal.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [editor, status_bar] = compute_layout(frame);

    editor_view::render_editor(frame, editor, state, theme);
    chat_view::render_chat_widget(frame, state, theme);
    render_status_bar(frame, status_bar, state, theme);
    chat_view::render_context_menu(frame, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::ConfirmQuit => render_confirm_quit(frame, theme),
        Mode::Normal | Mode::Insert | Mode::Menu => {}
    }
}
