//! In-memory fakes of every collaborator the engine talks to.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use inlay_core::{
    Capabilities, ContentWidget, ContextMenu, DiffWidget, Disposable, DocumentUri, EditorSurface,
    EngineEvent, FeatureRegistry, InlineChatAction, InlineChatContribution, InlineChatOptions,
    InlineChatServices, PreferenceSource, TextPosition, TextRange, WidgetFactory,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

pub struct FakeEditor {
    pub uri: Option<DocumentUri>,
    pub lines: Vec<String>,
    pub selection: Option<TextRange>,
    pub hidden: Vec<TextRange>,
    pub edits: Vec<(TextRange, String)>,
    pub line_height: u32,
}

impl FakeEditor {
    pub fn new(text: &str) -> Self {
        Self {
            uri: Some(DocumentUri::file("/tmp/sample.rs")),
            lines: text.split('\n').map(str::to_owned).collect(),
            selection: None,
            hidden: Vec::new(),
            edits: Vec::new(),
            line_height: 20,
        }
    }

    pub fn select(&mut self, start_line: u32, start_col: u32, end_line: u32, end_col: u32) {
        self.selection = Some(TextRange::from_coords(start_line, start_col, end_line, end_col));
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn byte_at(line: &str, column: u32) -> usize {
        line.char_indices()
            .nth(column.saturating_sub(1) as usize)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    fn offsets(&self, pos: TextPosition) -> (usize, usize) {
        let row = (pos.line.saturating_sub(1) as usize).min(self.lines.len() - 1);
        (row, Self::byte_at(&self.lines[row], pos.column))
    }
}

impl EditorSurface for FakeEditor {
    fn uri(&self) -> Option<DocumentUri> {
        self.uri.clone()
    }

    fn has_model(&self) -> bool {
        true
    }

    fn selection(&self) -> Option<TextRange> {
        self.selection
    }

    fn value_in_range(&self, range: TextRange) -> String {
        let (start_row, start_byte) = self.offsets(range.start);
        let (end_row, end_byte) = self.offsets(range.end);
        if start_row == end_row {
            return self.lines[start_row][start_byte..end_byte.max(start_byte)].to_owned();
        }
        let mut out = self.lines[start_row][start_byte..].to_owned();
        for line in &self.lines[start_row + 1..end_row] {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out.push_str(&self.lines[end_row][..end_byte]);
        out
    }

    fn push_edit(&mut self, range: TextRange, text: &str) {
        let (start_row, start_byte) = self.offsets(range.start);
        let (end_row, end_byte) = self.offsets(range.end);
        let joined = format!(
            "{}{}{}",
            &self.lines[start_row][..start_byte],
            text,
            &self.lines[end_row][end_byte..]
        );
        let replacement: Vec<String> = joined.split('\n').map(str::to_owned).collect();
        self.lines.splice(start_row..=end_row, replacement);
        self.edits.push((range, text.to_owned()));
    }

    fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn set_hidden_ranges(&mut self, ranges: &[TextRange], _owner: &'static str) {
        self.hidden = ranges.to_vec();
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct WidgetLog {
    pub content_created: u32,
    pub content_live: i32,
    pub max_content_live: i32,
    pub diff_created: u32,
    pub diff_live: i32,
    pub max_diff_live: i32,
    pub double_dispose: bool,
    pub shown_actions: Vec<String>,
    pub content_position: Option<TextPosition>,
    pub offset_top: Option<u32>,
    pub diff_range: Option<TextRange>,
    pub diff_original: Option<String>,
    pub diff_proposed: Option<String>,
    pub show_by_line: Option<(u32, u32)>,
}

pub type SharedLog = Rc<RefCell<WidgetLog>>;

pub struct FakeContent {
    log: SharedLog,
    disposed: bool,
}

impl Disposable for FakeContent {
    fn dispose(&mut self) {
        let mut log = self.log.borrow_mut();
        if self.disposed {
            log.double_dispose = true;
            return;
        }
        self.disposed = true;
        log.content_live -= 1;
    }
}

impl ContentWidget for FakeContent {
    fn show(&mut self, _selection: TextRange, actions: &[InlineChatAction]) {
        self.log.borrow_mut().shown_actions = actions.iter().map(|a| a.id.clone()).collect();
    }

    fn set_position(&mut self, position: TextPosition) {
        self.log.borrow_mut().content_position = Some(position);
    }

    fn offset_top(&mut self, offset: u32) {
        self.log.borrow_mut().offset_top = Some(offset);
    }
}

pub struct FakeDiff {
    log: SharedLog,
    disposed: bool,
}

impl Disposable for FakeDiff {
    fn dispose(&mut self) {
        let mut log = self.log.borrow_mut();
        if self.disposed {
            log.double_dispose = true;
            return;
        }
        self.disposed = true;
        log.diff_live -= 1;
    }
}

impl DiffWidget for FakeDiff {
    fn show_by_line(&mut self, line: u32, height: u32) {
        self.log.borrow_mut().show_by_line = Some((line, height));
    }
}

pub struct FakeFactory {
    pub log: SharedLog,
}

impl WidgetFactory for FakeFactory {
    type Content = FakeContent;
    type Diff = FakeDiff;

    fn content_widget(&mut self, _editor: &dyn EditorSurface) -> FakeContent {
        let mut log = self.log.borrow_mut();
        log.content_created += 1;
        log.content_live += 1;
        log.max_content_live = log.max_content_live.max(log.content_live);
        FakeContent { log: Rc::clone(&self.log), disposed: false }
    }

    fn diff_widget(
        &mut self,
        _editor: &dyn EditorSurface,
        range: TextRange,
        original: &str,
        proposed: &str,
    ) -> FakeDiff {
        let mut log = self.log.borrow_mut();
        log.diff_created += 1;
        log.diff_live += 1;
        log.max_diff_live = log.max_diff_live.max(log.diff_live);
        log.diff_range = Some(range);
        log.diff_original = Some(original.to_owned());
        log.diff_proposed = Some(proposed.to_owned());
        FakeDiff { log: Rc::clone(&self.log), disposed: false }
    }
}

// ---------------------------------------------------------------------------
// Menu and preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeMenu {
    pub forced_hides: u32,
    pub on_hidden_cleared: bool,
}

impl ContextMenu for FakeMenu {
    fn hide(&mut self, force: bool) {
        if force {
            self.forced_hides += 1;
        }
    }

    fn clear_on_hidden(&mut self) {
        self.on_hidden_cleared = true;
    }
}

#[derive(Debug)]
pub struct AutoShow(pub AtomicBool);

impl PreferenceSource for AutoShow {
    fn auto_show_inline_chat(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub type Contribution = InlineChatContribution<FakeFactory, FakeMenu>;

pub struct Harness {
    pub chat: Contribution,
    pub editor: FakeEditor,
    pub log: SharedLog,
    pub events: UnboundedReceiver<EngineEvent>,
    pub auto_show: Arc<AutoShow>,
}

pub const SAMPLE: &str = "fn main() {\n    let x = 1;\n    println!(\"{x}\");\n}";

impl Harness {
    pub fn new(registry: FeatureRegistry) -> Self {
        Self::with_editor(registry, FakeEditor::new(SAMPLE), Capabilities::default())
    }

    pub fn with_editor(registry: FeatureRegistry, editor: FakeEditor, capabilities: Capabilities) -> Self {
        let log: SharedLog = Rc::default();
        let auto_show = Arc::new(AutoShow(AtomicBool::new(true)));
        let (tx, rx) = unbounded_channel();
        let services = InlineChatServices {
            capabilities,
            registry: Arc::new(registry),
            preferences: auto_show.clone(),
        };
        let options = InlineChatOptions { debounce: Duration::from_millis(100), overflow_padding: 12 };
        let chat = InlineChatContribution::contribute(
            &editor,
            services,
            FakeFactory { log: Rc::clone(&log) },
            FakeMenu::default(),
            tx,
            options,
        );
        Self { chat, editor, log, events: rx, auto_show }
    }

    /// Waits for the next engine event and feeds it back into the contribution.
    pub async fn pump(&mut self) -> EngineEvent {
        let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("engine event within timeout")
            .expect("engine channel open");
        self.chat.handle_engine_event(&mut self.editor, event.clone());
        event
    }
}
