//! Frame layout for inlay: the buffer view above a one-row status bar.
//!
//! Pure layout arithmetic plus the two small widgets that depend on nothing
//! but the frame (status bar, quit dialog). Called inside `terminal.draw()` on
//! every render, so every frame reflects the current terminal size.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph},
};

use inlay_core::ChatStatus;

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Returns `[editor, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 2] {
    frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]))
}

/// Foreground color for a chat status badge.
pub fn status_color(status: ChatStatus, theme: &Theme) -> ratatui::style::Color {
    match status {
        ChatStatus::Ready => theme.chat_action,
        ChatStatus::Thinking => theme.status_thinking,
        ChatStatus::Done => theme.status_done,
        ChatStatus::Error => theme.status_error,
    }
}

/// Renders the 1-row status bar at the bottom of the terminal.
///
/// Left side: mode, file name with a dirty marker, cursor position and, while
/// a session is open, the inline chat status. Right side: the latest status
/// message, if any, and whether auto-show is on.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mode_text = match state.mode {
        Mode::Insert => " INSERT ",
        Mode::Menu => " MENU ",
        Mode::Normal | Mode::HelpOverlay | Mode::ConfirmQuit => " NORMAL ",
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let cursor = state.document.cursor();

    let mut left = vec![
        Span::styled(mode_text, bold),
        Span::raw(" "),
        Span::raw(state.document.display_name()),
    ];
    if state.document.is_dirty() {
        left.push(Span::styled(" [+]", Style::default().fg(theme.status_dirty)));
    }
    left.push(Span::raw(format!("  {}:{}", cursor.line, cursor.column)));
    if state.chat_open() {
        let status = state.chat.status();
        left.push(Span::raw("  chat "));
        left.push(Span::styled(status.label(), bold.fg(status_color(status, theme))));
    }

    let mut right = Vec::new();
    if let Some(message) = state.status_message() {
        right.push(Span::raw(format!("{message}  ")));
    }
    if state.preferences.auto_show() {
        right.push(Span::raw("auto "));
    }

    let bar = Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg);
    frame.render_widget(Paragraph::new(Line::from(left)).style(bar), area);
    frame.render_widget(Paragraph::new(Line::from(right).right_aligned()).style(bar), area);
}

/// Small centered dialog asking to discard unsaved edits.
pub fn render_confirm_quit(frame: &mut Frame, theme: &Theme) {
    let area = frame.area().centered(Constraint::Length(44), Constraint::Length(3));
    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(theme.status_error));
    frame.render_widget(
        Paragraph::new(Line::from(" Unsaved changes. Quit anyway? (y/n) ")).block(block),
        area,
    );
}
