//! Help overlay renderer for inlay.
//!
//! Draws a centred modal box over the buffer using ratatui's `Clear` widget to
//! erase the background first, inside the same `terminal.draw()` closure as
//! everything else.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay, scrolled down by `help_scroll` rows.
///
/// Skipped on terminals narrower than 60 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to dismiss) ")
        .border_style(Style::default().fg(theme.chat_border));

    frame.render_widget(
        Paragraph::new(build_help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text(theme: &Theme) -> Text<'static> {
    let heading = |title: &'static str| {
        Line::styled(title, Style::default().fg(theme.chat_action).add_modifier(Modifier::BOLD))
    };
    Text::from(vec![
        heading("Editing"),
        Line::from("  i / Esc       Enter / leave insert mode"),
        Line::from("  arrows        Move the cursor (Shift extends the selection)"),
        Line::from("  h j k l       Move the cursor (normal mode)"),
        Line::from("  x             Select the line, again to grow by a line"),
        Line::from("  g / G         First / last line"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Ctrl-a        Select all"),
        Line::from("  Ctrl-z        Undo"),
        Line::from("  Ctrl-s        Save"),
        Line::from("  Ctrl-r        Reload from disk"),
        Line::from(""),
        heading("Inline chat"),
        Line::from("  Ctrl-k        Open for the current selection"),
        Line::from("  mouse select  Opens on release when auto-show is on"),
        Line::from("  Ctrl-t        Toggle auto-show"),
        Line::from("  1-9           Run an action"),
        Line::from("  Enter / a     Accept the proposed change"),
        Line::from("  r             Regenerate (retry after an error)"),
        Line::from("  Esc / d       Discard"),
        Line::from(""),
        heading("Mouse"),
        Line::from("  drag          Select"),
        Line::from("  right click   Context menu"),
        Line::from("  wheel         Scroll"),
        Line::from(""),
        heading("General"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Ctrl-q    Quit (confirms if the buffer is modified)"),
    ])
}
