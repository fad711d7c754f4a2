//! Inline chat content widget and the context menu overlay.
//!
//! The content widget is a two-line bordered box: a status badge followed by
//! the numbered actions, then the hints for the current status. Every
//! clickable span is recorded as a hitbox on `AppState` so the next mouse
//! event can be routed without re-running layout.

use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph},
};

use inlay_core::ChatStatus;

use crate::app::{AppState, ChatHit};
use crate::menu::MenuItem;
use crate::theme::Theme;
use crate::ui::editor_view::anchor_row;
use crate::ui::layout::status_color;

const BOX_HEIGHT: u16 = 4;
const MIN_BOX_WIDTH: u16 = 32;

/// One line of the box with the hitboxes of its spans, as x offsets.
#[derive(Default)]
struct HitLine {
    spans: Vec<Span<'static>>,
    width: u16,
    hits: Vec<(u16, u16, ChatHit)>,
}

impl HitLine {
    fn push(&mut self, text: impl Into<String>, style: Style, hit: Option<ChatHit>) {
        let span = Span::styled(text.into(), style);
        let width = span.width() as u16;
        if let Some(hit) = hit {
            self.hits.push((self.width, width, hit));
        }
        self.width += width;
        self.spans.push(span);
    }
}

fn hint_line(status: ChatStatus, theme: &Theme) -> HitLine {
    let key = Style::default().fg(theme.chat_action).add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(theme.diff_context);
    let mut line = HitLine::default();
    match status {
        ChatStatus::Ready => line.push("pick an action: 1-9 or click", dim, None),
        ChatStatus::Thinking => {
            line.push("thinking…  ", dim, None);
            line.push("[Esc] cancel", key, Some(ChatHit::Discard));
        }
        ChatStatus::Done => {
            line.push("[Enter] accept", key, Some(ChatHit::Accept));
            line.push("  ", dim, None);
            line.push("[r] regenerate", key, Some(ChatHit::Regenerate));
            line.push("  ", dim, None);
            line.push("[Esc] discard", key, Some(ChatHit::Discard));
        }
        ChatStatus::Error => {
            line.push("request failed  ", Style::default().fg(theme.status_error), None);
            line.push("[r] retry", key, Some(ChatHit::Regenerate));
            line.push("  ", dim, None);
            line.push("[Esc] discard", key, Some(ChatHit::Discard));
        }
    }
    line
}

/// Draws the content widget, if one is live and its anchor is on screen.
pub fn render_chat_widget(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    state.chat_area = Rect::default();
    state.chat_hitboxes.clear();

    let widgets = state.chat.widgets();
    let Some(widget) = widgets.content_widget() else {
        return;
    };
    let status = state.chat.status();
    let growth = widgets.diff_widget().map_or(0, |d| d.growth());
    let row = anchor_row(&state.rows, widget.anchor_line, growth) + widget.offset_rows as usize;

    let area = state.editor_area;
    if row < state.scroll || area.height < BOX_HEIGHT {
        return;
    }
    let top = area.y as usize + (row - state.scroll);
    let bottom_limit = (area.y + area.height - BOX_HEIGHT) as usize;
    if top >= bottom_limit + BOX_HEIGHT as usize {
        return;
    }
    let y = top.min(bottom_limit) as u16;

    let mut actions = HitLine::default();
    actions.push(
        format!("{} ", status.label()),
        Style::default().fg(status_color(status, theme)).add_modifier(Modifier::BOLD),
        None,
    );
    for (i, action) in widget.actions.iter().enumerate() {
        let style = Style::default().fg(theme.text);
        actions.push(" ", style, None);
        actions.push(
            format!("[{}] {}", i + 1, action.label),
            style,
            Some(ChatHit::Action(action.id.clone())),
        );
    }
    let hints = hint_line(status, theme);

    let x = area.x + state.gutter_width;
    let available = area.width.saturating_sub(state.gutter_width);
    let width = (actions.width.max(hints.width) + 2).max(MIN_BOX_WIDTH).min(available);
    if width < 3 {
        return;
    }
    let rect = Rect::new(x, y, width, BOX_HEIGHT);

    for (line_y, line) in [(y + 1, &actions), (y + 2, &hints)] {
        for (offset, span_width, hit) in &line.hits {
            let hit_x = x + 1 + offset;
            if hit_x < x + width - 1 {
                let clipped = (*span_width).min(x + width - 1 - hit_x);
                state.chat_hitboxes.push((Rect::new(hit_x, line_y, clipped, 1), hit.clone()));
            }
        }
    }
    state.chat_area = rect;

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.chat_border))
        .title(" inline chat ");
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(vec![Line::from(actions.spans), Line::from(hints.spans)])
            .block(block)
            .style(Style::default().bg(theme.background)),
        rect,
    );
}

/// Draws the right-click menu and records its area for hit testing.
pub fn render_context_menu(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let menu = state.chat.context_menu_mut();
    let Some(Position { x, y }) = menu.position() else {
        return;
    };
    let screen = frame.area();
    let label_width = MenuItem::ALL.iter().map(|item| item.label().len()).max().unwrap_or(0);
    let width = (label_width as u16 + 4).min(screen.width);
    let height = (MenuItem::ALL.len() as u16 + 2).min(screen.height);
    let x = x.min(screen.right().saturating_sub(width));
    let y = y.min(screen.bottom().saturating_sub(height));
    let rect = Rect::new(x, y, width, height);
    menu.area = rect;

    let lines: Vec<Line<'static>> = MenuItem::ALL
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == menu.highlighted() {
                Style::default().bg(theme.menu_highlight_bg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            Line::from(Span::styled(format!(" {:<label_width$} ", item.label()), style))
        })
        .collect();

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::bordered().border_style(Style::default().fg(theme.menu_border)))
            .style(Style::default().bg(theme.background)),
        rect,
    );
}
