//! Terminal implementations of the inline chat widgets.
//!
//! Widgets here are plain render state. The engine owns them through its
//! lifecycle manager; `ui::chat_view` reads them back on every frame.

use inlay_core::{
    ContentWidget, DiffWidget, Disposable, EditorSurface, InlineChatAction, TextPosition,
    TextRange, WidgetEvent, WidgetFactory,
};
use ratatui::text::Line;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;
use crate::highlight;
use crate::theme::Theme;

/// Action list, status badge and accept/regenerate/discard hints.
#[derive(Debug)]
pub struct TuiContentWidget {
    pub actions: Vec<InlineChatAction>,
    /// 1-based line the widget is drawn on; may be one past the last line.
    pub anchor_line: u32,
    /// Extra rows pushed down from the anchor.
    pub offset_rows: u32,
    pub disposed: bool,
}

impl Disposable for TuiContentWidget {
    fn dispose(&mut self) {
        self.disposed = true;
        self.actions.clear();
    }
}

impl ContentWidget for TuiContentWidget {
    /// Anchored right below the selection.
    fn show(&mut self, selection: TextRange, actions: &[InlineChatAction]) {
        self.actions = actions.to_vec();
        self.anchor_line = selection.end_line() + 1;
        self.offset_rows = 0;
    }

    fn set_position(&mut self, position: TextPosition) {
        self.anchor_line = position.line;
        self.offset_rows = 0;
    }

    fn offset_top(&mut self, offset: u32) {
        self.offset_rows = offset;
    }
}

/// Highlighted diff shown in a zone inserted above the hidden range.
#[derive(Debug)]
pub struct TuiDiffWidget {
    pub range: TextRange,
    pub lines: Vec<Line<'static>>,
    /// 0-based line the zone follows, i.e. the zone sits before 1-based line
    /// `after_line + 1`.
    pub after_line: u32,
    /// Rows requested by the engine.
    pub reserved_rows: u32,
    /// Rows actually drawn (reserved plus growth, capped).
    pub rows: u32,
    max_rows: u32,
    events: UnboundedSender<AppEvent>,
    pub disposed: bool,
}

impl TuiDiffWidget {
    /// Rows drawn beyond the reserved height.
    pub fn growth(&self) -> u32 {
        self.rows.saturating_sub(self.reserved_rows)
    }
}

impl Disposable for TuiDiffWidget {
    fn dispose(&mut self) {
        self.disposed = true;
        self.lines.clear();
    }
}

impl DiffWidget for TuiDiffWidget {
    /// Reserves `height` rows; if the diff needs more it grows, up to the
    /// configured maximum, and reports the growth as an overflow.
    fn show_by_line(&mut self, line: u32, height: u32) {
        self.after_line = line;
        self.reserved_rows = height;
        let needed = self.lines.len() as u32;
        self.rows = needed.min(self.max_rows).max(height);
        let growth = self.growth();
        if growth > 0 {
            tracing::trace!(growth, "diff overlay grew past its reserved height");
            // The loop owns the receiver for the whole run.
            let _ = self.events.send(AppEvent::Widget(WidgetEvent::DiffOverflow(growth)));
        }
    }
}

pub struct TuiWidgetFactory {
    theme: Theme,
    max_diff_rows: u32,
    events: UnboundedSender<AppEvent>,
}

impl TuiWidgetFactory {
    pub fn new(theme: Theme, max_diff_rows: u16, events: UnboundedSender<AppEvent>) -> Self {
        Self { theme, max_diff_rows: u32::from(max_diff_rows.max(1)), events }
    }
}

impl WidgetFactory for TuiWidgetFactory {
    type Content = TuiContentWidget;
    type Diff = TuiDiffWidget;

    fn content_widget(&mut self, _editor: &dyn EditorSurface) -> TuiContentWidget {
        TuiContentWidget { actions: Vec::new(), anchor_line: 1, offset_rows: 0, disposed: false }
    }

    fn diff_widget(
        &mut self,
        editor: &dyn EditorSurface,
        range: TextRange,
        original: &str,
        proposed: &str,
    ) -> TuiDiffWidget {
        let extension = editor.uri().and_then(|uri| uri.extension());
        let lines = highlight::diff_lines(original, proposed, extension.as_deref(), &self.theme);
        TuiDiffWidget {
            range,
            lines,
            after_line: range.start_line().saturating_sub(1),
            reserved_rows: 0,
            rows: 0,
            max_rows: self.max_diff_rows,
            events: self.events.clone(),
            disposed: false,
        }
    }
}
