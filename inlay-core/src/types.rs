//! Owned value types shared by every engine module.
//!
//! Positions are 1-based (line 1, column 1 is the first character) to match
//! what editor surfaces report. All types are plain data and `Send`, so
//! strategy requests built from them can cross into spawned tokio tasks.

use std::fmt;
use std::path::PathBuf;

use uuid::Uuid;

/// End-of-line sentinel column used by line-aligned ranges.
///
/// Editor surfaces clamp any column past the end of a line to the line end,
/// so a range ending at `MAX_COLUMN` always covers the whole last line.
pub const MAX_COLUMN: u32 = u32::MAX;

/// URI scheme of documents backed by a local file.
pub const FILE_SCHEME: &str = "file";

/// A 1-based line/column position inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPosition {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column; may be [`MAX_COLUMN`] to mean "end of line".
    pub column: u32,
}

impl TextPosition {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A half-open text range `[start, end)` between two positions.
///
/// `start` is always the smaller position; constructors normalise reversed
/// selections (a drag that went upwards) so callers never have to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextRange {
    /// Builds a range from two positions in either order.
    pub fn new(a: TextPosition, b: TextPosition) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Convenience constructor from raw line/column numbers.
    pub fn from_coords(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self::new(
            TextPosition::new(start_line, start_column),
            TextPosition::new(end_line, end_column),
        )
    }

    pub fn start_line(&self) -> u32 {
        self.start.line
    }

    pub fn end_line(&self) -> u32 {
        self.end.line
    }

    /// Number of lines touched by the range (at least 1).
    pub fn line_span(&self) -> u32 {
        self.end.line - self.start.line + 1
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` when `other` lies entirely inside `self`.
    pub fn contains_range(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` when the range starts at column 1 and ends on the
    /// end-of-line sentinel.
    pub fn is_line_aligned(&self) -> bool {
        self.start.column == 1 && self.end.column == MAX_COLUMN
    }
}

/// Identity of the document an editor currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentUri {
    /// URI scheme, e.g. `"file"` or `"untitled"`.
    pub scheme: String,
    pub path: PathBuf,
}

impl DocumentUri {
    pub fn new(scheme: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { scheme: scheme.into(), path: path.into() }
    }

    /// A `file://` URI for a path on local disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FILE_SCHEME, path)
    }

    pub fn is_file(&self) -> bool {
        self.scheme == FILE_SCHEME
    }

    /// Lowercase file extension, used by hosts to pick a syntax.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

impl fmt::Display for DocumentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path.display())
    }
}

/// Lifecycle state of the active inline chat session.
///
/// The single source of truth for what the UI may show. Valid transitions are
/// enforced by [`crate::status::ChatStatusMachine`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatStatus {
    /// Idle: no request in flight.
    #[default]
    Ready,
    /// A diff-preview strategy call is in flight.
    Thinking,
    /// A reply is ready and shown as a diff.
    Done,
    /// The last call failed or produced nothing usable.
    Error,
}

impl ChatStatus {
    /// Short upper-case label for status bars and log lines.
    pub fn label(self) -> &'static str {
        match self {
            ChatStatus::Ready => "READY",
            ChatStatus::Thinking => "THINKING",
            ChatStatus::Done => "DONE",
            ChatStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one strategy invocation.
///
/// Failures and cancellations are values, not panics or `Err`s: a strategy
/// always resolves to exactly one of these three shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyResponse {
    /// Raw reply text, possibly wrapping the answer in a fenced code block.
    Reply(String),
    /// The external call failed; the message is for logs only.
    Error(String),
    /// The call observed the cancellation token and gave up.
    Cancel,
}

impl StrategyResponse {
    pub fn reply(text: impl Into<String>) -> Self {
        StrategyResponse::Reply(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        StrategyResponse::Error(message.into())
    }
}

/// Identity of one chat session (trigger → full reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The short form is enough to correlate log lines.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

/// Tags a strategy invocation with the session and attempt that started it.
///
/// Completions carry their ticket back so the orchestrator can tell a live
/// result from one whose session was torn down while it was pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationTicket {
    pub session: SessionId,
    /// Monotonic attempt counter, bumped on every run and regenerate.
    pub seq: u64,
}
