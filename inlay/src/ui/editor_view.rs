//! Buffer view: numbered document lines with the diff zone spliced in.
//!
//! The view is a list of visual rows. Lines under the hidden range are left
//! out and the diff widget's rows are inserted right before the first line
//! after the zone's anchor. The row list is cached on `AppState` for mouse
//! hit testing on the next event.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use inlay_core::{EditorSurface, TextPosition, TextRange};

use crate::app::{AppState, Row};
use crate::document::Document;
use crate::theme::Theme;
use crate::widgets::TuiDiffWidget;

/// Builds the visual row list for `document` with an optional diff zone.
pub fn visual_rows(document: &Document, diff: Option<&TuiDiffWidget>) -> Vec<Row> {
    let line_count = document.lines().len() as u32;
    let mut rows = Vec::with_capacity(line_count as usize);
    let push_zone = |rows: &mut Vec<Row>, diff: &TuiDiffWidget| {
        rows.extend((0..diff.rows).map(Row::Diff));
    };
    for line in 1..=line_count {
        if let Some(diff) = diff.filter(|d| d.after_line + 1 == line) {
            push_zone(&mut rows, diff);
        }
        if !document.is_hidden(line) {
            rows.push(Row::Text(line));
        }
    }
    if let Some(diff) = diff.filter(|d| d.after_line >= line_count) {
        push_zone(&mut rows, diff);
    }
    rows
}

/// Visual row the content widget is drawn on, before its offset.
///
/// The anchor's own row when visible, the next visible line otherwise, and
/// right under the diff zone's reserved rows when the anchor is past the end.
pub fn anchor_row(rows: &[Row], anchor_line: u32, zone_growth: u32) -> usize {
    rows.iter()
        .position(|row| matches!(row, Row::Text(line) if *line >= anchor_line))
        .unwrap_or_else(|| rows.len().saturating_sub(zone_growth as usize))
}

fn gutter_width(line_count: usize) -> u16 {
    // digits, a space, and one column for the zone marker
    line_count.max(1).to_string().len() as u16 + 2
}

/// Columns of 1-based `line` covered by `selection`, as a half-open range.
/// The end may run one past the last character to show the line break.
fn selected_columns(selection: Option<TextRange>, line: u32, len: u32) -> Option<(u32, u32)> {
    let selection = selection?;
    if line < selection.start.line || line > selection.end.line {
        return None;
    }
    let from = if line == selection.start.line { selection.start.column } else { 1 };
    let to = if line == selection.end.line { selection.end.column } else { len + 2 };
    (from < to).then_some((from, to))
}

fn text_spans(
    text: &str,
    line: u32,
    selection: Option<TextRange>,
    cursor: TextPosition,
    theme: &Theme,
) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as u32;
    let selected = selected_columns(selection, line, len);
    let style_at = |column: u32| {
        let mut style = Style::default().fg(theme.text);
        if selected.is_some_and(|(from, to)| from <= column && column < to) {
            style = style.bg(theme.selection_bg);
        }
        if cursor.line == line && cursor.column == column {
            style = style.bg(theme.cursor_bg).add_modifier(Modifier::BOLD);
        }
        style
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = style_at(1);
    for (i, c) in chars.iter().enumerate() {
        let style = style_at(i as u32 + 1);
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(*c);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    // A cell past the end for the cursor or a selected line break.
    let tail = style_at(len + 1);
    if tail != Style::default().fg(theme.text) {
        spans.push(Span::styled(" ", tail));
    }
    spans
}

fn diff_row_spans(diff: &TuiDiffWidget, index: u32) -> Vec<Span<'static>> {
    let index = index as usize;
    let shown = diff.rows as usize;
    let total = diff.lines.len();
    if total > shown && index + 1 == shown {
        return vec![Span::styled(
            format!("… {} more lines", total - index),
            Style::default().add_modifier(Modifier::ITALIC),
        )];
    }
    diff.lines.get(index).map(|line| line.spans.clone()).unwrap_or_default()
}

/// Renders the buffer into `area` and caches the row list and geometry.
pub fn render_editor(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let diff = state.chat.widgets().diff_widget();
    let rows = visual_rows(&state.document, diff);
    let height = area.height as usize;

    if state.follow_cursor {
        let cursor_line = state.document.cursor().line;
        if let Some(index) = rows.iter().position(|row| *row == Row::Text(cursor_line)) {
            if index < state.scroll {
                state.scroll = index;
            } else if height > 0 && index >= state.scroll + height {
                state.scroll = index + 1 - height;
            }
        }
    }
    state.scroll = state.scroll.min(rows.len().saturating_sub(1));

    let gutter = gutter_width(state.document.lines().len());
    let number_width = gutter as usize - 2;
    let gutter_style = Style::default().fg(theme.gutter);
    let selection = state.document.selection();
    let cursor = state.document.cursor();
    let diff = state.chat.widgets().diff_widget();

    let lines: Vec<Line<'static>> = rows
        .iter()
        .skip(state.scroll)
        .take(height)
        .map(|row| match *row {
            Row::Text(line) => {
                let text = state
                    .document
                    .lines()
                    .get(line as usize - 1)
                    .map(String::as_str)
                    .unwrap_or_default();
                let mut spans =
                    vec![Span::styled(format!("{line:>number_width$}  "), gutter_style)];
                spans.extend(text_spans(text, line, selection, cursor, theme));
                Line::from(spans)
            }
            Row::Diff(index) => {
                let mut spans = vec![
                    Span::raw(" ".repeat(number_width + 1)),
                    Span::styled("┃", Style::default().fg(theme.diff_border)),
                ];
                if let Some(diff) = diff {
                    spans.extend(diff_row_spans(diff, index));
                }
                Line::from(spans)
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(theme.background)), area);

    state.rows = rows;
    state.editor_area = area;
    state.gutter_width = gutter;
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_core::{DiffWidget, DocumentUri, MAX_COLUMN, WidgetFactory};
    use tokio::sync::mpsc::unbounded_channel;

    use crate::widgets::TuiWidgetFactory;

    fn doc(text: &str) -> Document {
        Document::from_text(DocumentUri::file("/tmp/view.rs"), text)
    }

    fn zone(document: &Document, range: TextRange, proposed: &str, line: u32, height: u32) -> TuiDiffWidget {
        let (tx, _rx) = unbounded_channel();
        let mut factory = TuiWidgetFactory::new(Theme::dark(), 12, tx);
        let original = document.value_in_range(range);
        let mut widget = factory.diff_widget(document, range, &original, proposed);
        widget.show_by_line(line, height);
        widget
    }

    #[test]
    fn plain_document_is_one_row_per_line() {
        let document = doc("a\nb\nc");
        assert_eq!(visual_rows(&document, None), [Row::Text(1), Row::Text(2), Row::Text(3)]);
    }

    #[test]
    fn zone_replaces_hidden_lines() {
        let mut document = doc("a\nb\nc");
        let range = TextRange::from_coords(2, 1, 2, MAX_COLUMN);
        document.set_hidden_ranges(&[range], "test");
        let widget = zone(&document, range, "B", 1, 2);

        assert_eq!(
            visual_rows(&document, Some(&widget)),
            [Row::Text(1), Row::Diff(0), Row::Diff(1), Row::Text(3)]
        );
    }

    #[test]
    fn zone_after_the_last_line() {
        let mut document = doc("a\nb");
        let range = TextRange::from_coords(2, 1, 2, MAX_COLUMN);
        document.set_hidden_ranges(&[range], "test");
        let widget = zone(&document, range, "x\ny\nz", 1, 1);

        let rows = visual_rows(&document, Some(&widget));
        // "- b" plus three additions.
        assert_eq!(rows, [Row::Text(1), Row::Diff(0), Row::Diff(1), Row::Diff(2), Row::Diff(3)]);
        assert_eq!(anchor_row(&rows, 3, widget.growth()), 2);
    }

    #[test]
    fn anchor_skips_hidden_lines() {
        let rows = [Row::Text(1), Row::Diff(0), Row::Text(4)];
        assert_eq!(anchor_row(&rows, 2, 0), 2);
        assert_eq!(anchor_row(&rows, 1, 0), 0);
    }

    #[test]
    fn selection_covers_line_breaks_of_inner_lines() {
        let selection = Some(TextRange::from_coords(1, 3, 3, 2));
        assert_eq!(selected_columns(selection, 1, 5), Some((3, 7)));
        assert_eq!(selected_columns(selection, 2, 4), Some((1, 6)));
        assert_eq!(selected_columns(selection, 3, 4), Some((1, 2)));
        assert_eq!(selected_columns(selection, 4, 4), None);
    }
}
