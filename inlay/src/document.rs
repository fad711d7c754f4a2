//! The text buffer being edited, and the inline chat engine's view of it.
//!
//! Positions are 1-based `(line, column)` pairs counted in characters, the
//! same convention the engine uses. Columns past the end of a line (including
//! the `MAX_COLUMN` sentinel) clamp to the end of that line.

use std::path::{Path, PathBuf};

use inlay_core::{DocumentUri, EditorSurface, TextPosition, TextRange};

/// Undo depth. Older snapshots are dropped.
const UNDO_LIMIT: usize = 200;

#[derive(Debug, Clone)]
struct Snapshot {
    lines: Vec<String>,
    cursor: TextPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
}

#[derive(Debug)]
pub struct Document {
    uri: DocumentUri,
    path: Option<PathBuf>,
    lines: Vec<String>,
    cursor: TextPosition,
    /// Other end of the selection, if one is being made.
    anchor: Option<TextPosition>,
    undo: Vec<Snapshot>,
    hidden: Vec<TextRange>,
    dirty: bool,
}

impl Document {
    /// Opens `path`. A path that does not exist yet becomes an empty buffer
    /// that is created on first save.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        let absolute = std::path::absolute(path)?;
        let mut doc = Self::from_text(DocumentUri::file(&absolute), &text);
        doc.path = Some(path.to_owned());
        Ok(doc)
    }

    /// An unsaved scratch buffer. Its scheme is `untitled`, so inline chat
    /// never attaches to it.
    pub fn scratch() -> Self {
        Self::from_text(DocumentUri::new("untitled", "scratch"), "")
    }

    pub fn from_text(uri: DocumentUri, text: &str) -> Self {
        let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
        // A trailing newline terminates the last line rather than opening a new one.
        if text.ends_with('\n') && lines.len() > 1 {
            lines.pop();
        }
        Self {
            uri,
            path: None,
            lines,
            cursor: TextPosition::new(1, 1),
            anchor: None,
            undo: Vec::new(),
            hidden: Vec::new(),
            dirty: false,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "[scratch]".to_owned(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn cursor(&self) -> TextPosition {
        self.cursor
    }

    /// Writes the buffer back to its file with a trailing newline.
    ///
    /// # Errors
    ///
    /// Fails for scratch buffers and on any I/O error.
    pub fn save(&mut self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "scratch buffer has no file",
            ));
        };
        let mut text = self.text();
        text.push('\n');
        std::fs::write(path, text)?;
        self.dirty = false;
        tracing::info!(path = %path.display(), "saved");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Cursor and selection
    // -----------------------------------------------------------------------

    /// Number of characters on 1-based `line`.
    fn line_len(&self, line: u32) -> u32 {
        self.lines
            .get(line.saturating_sub(1) as usize)
            .map(|l| l.chars().count() as u32)
            .unwrap_or(0)
    }

    /// Clamps `pos` onto an existing line and column.
    pub fn clamp(&self, pos: TextPosition) -> TextPosition {
        let line = pos.line.clamp(1, self.lines.len() as u32);
        let column = pos.column.clamp(1, self.line_len(line) + 1);
        TextPosition::new(line, column)
    }

    /// Byte index of `pos` inside its line's string.
    fn byte_offset(&self, pos: TextPosition) -> (usize, usize) {
        let pos = self.clamp(pos);
        let row = (pos.line - 1) as usize;
        let line = &self.lines[row];
        let byte = line
            .char_indices()
            .nth((pos.column - 1) as usize)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        (row, byte)
    }

    /// Moves the cursor to `pos`. With `extend` the selection anchor stays
    /// where it was (or is dropped at the old cursor); without it any
    /// selection is cleared.
    pub fn set_cursor(&mut self, pos: TextPosition, extend: bool) {
        let pos = self.clamp(pos);
        if extend {
            self.anchor.get_or_insert(self.cursor);
        } else {
            self.anchor = None;
        }
        self.cursor = pos;
    }

    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        let TextPosition { line, column } = self.cursor;
        let target = match motion {
            Motion::Left if column > 1 => TextPosition::new(line, column - 1),
            Motion::Left if line > 1 => TextPosition::new(line - 1, self.line_len(line - 1) + 1),
            Motion::Left => self.cursor,
            Motion::Right if column <= self.line_len(line) => TextPosition::new(line, column + 1),
            Motion::Right if (line as usize) < self.lines.len() => TextPosition::new(line + 1, 1),
            Motion::Right => self.cursor,
            Motion::Up => TextPosition::new(line.saturating_sub(1).max(1), column),
            Motion::Down => TextPosition::new(line + 1, column),
            Motion::LineStart => TextPosition::new(line, 1),
            Motion::LineEnd => TextPosition::new(line, self.line_len(line) + 1),
        };
        self.set_cursor(target, extend);
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(TextPosition::new(1, 1));
        let last = self.lines.len() as u32;
        self.cursor = TextPosition::new(last, self.line_len(last) + 1);
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    fn snapshot(&mut self) {
        if self.undo.len() == UNDO_LIMIT {
            self.undo.remove(0);
        }
        self.undo.push(Snapshot { lines: self.lines.clone(), cursor: self.cursor });
    }

    /// Replaces `range` with `text` and leaves the cursor after the inserted
    /// text. Records one undo step.
    fn replace(&mut self, range: TextRange, text: &str) {
        self.snapshot();
        let (start_row, start_byte) = self.byte_offset(range.start);
        let (end_row, end_byte) = self.byte_offset(range.end);
        let prefix = &self.lines[start_row][..start_byte];
        let suffix = &self.lines[end_row][end_byte..];
        let joined = format!("{prefix}{text}{suffix}");
        let suffix_chars = suffix.chars().count() as u32;

        let replacement: Vec<String> = joined.split('\n').map(str::to_owned).collect();
        let last_row = start_row + replacement.len() - 1;
        let last_len = replacement[replacement.len() - 1].chars().count() as u32;
        self.lines.splice(start_row..=end_row, replacement);

        self.cursor = TextPosition::new(last_row as u32 + 1, last_len - suffix_chars + 1);
        self.anchor = None;
        self.dirty = true;
    }

    /// Types `text` at the cursor, replacing the selection if there is one.
    pub fn insert(&mut self, text: &str) {
        let range = self
            .selection()
            .unwrap_or_else(|| TextRange::new(self.cursor, self.cursor));
        self.replace(range, text);
    }

    /// Deletes the selection, or the character before the cursor.
    pub fn backspace(&mut self) {
        if let Some(selection) = self.selection() {
            self.replace(selection, "");
            return;
        }
        let end = self.cursor;
        self.move_cursor(Motion::Left, false);
        if self.cursor != end {
            self.replace(TextRange::new(self.cursor, end), "");
        }
    }

    /// Deletes the selection, or the character under the cursor.
    pub fn delete(&mut self) {
        if let Some(selection) = self.selection() {
            self.replace(selection, "");
            return;
        }
        let start = self.cursor;
        self.move_cursor(Motion::Right, false);
        let end = self.cursor;
        self.cursor = start;
        if start != end {
            self.replace(TextRange::new(start, end), "");
        }
    }

    /// Restores the state before the last edit. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo.pop() else {
            return false;
        };
        self.lines = snapshot.lines;
        self.cursor = self.clamp(snapshot.cursor);
        self.anchor = None;
        self.dirty = true;
        true
    }

    // -----------------------------------------------------------------------
    // Hidden ranges
    // -----------------------------------------------------------------------

    /// Returns `true` when 1-based `line` is folded away under a diff overlay.
    pub fn is_hidden(&self, line: u32) -> bool {
        self.hidden.iter().any(|r| r.start.line <= line && line <= r.end.line)
    }

    pub fn hidden_ranges(&self) -> &[TextRange] {
        &self.hidden
    }
}

impl EditorSurface for Document {
    fn uri(&self) -> Option<DocumentUri> {
        Some(self.uri.clone())
    }

    fn has_model(&self) -> bool {
        true
    }

    fn selection(&self) -> Option<TextRange> {
        let anchor = self.anchor?;
        (anchor != self.cursor).then(|| TextRange::new(anchor, self.cursor))
    }

    fn value_in_range(&self, range: TextRange) -> String {
        let (start_row, start_byte) = self.byte_offset(range.start);
        let (end_row, end_byte) = self.byte_offset(range.end);
        if start_row == end_row {
            return self.lines[start_row][start_byte..end_byte].to_owned();
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
        self.replace(range, text);
    }

    fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// One terminal row per line.
    fn line_height(&self) -> u32 {
        1
    }

    fn set_hidden_ranges(&mut self, ranges: &[TextRange], owner: &'static str) {
        tracing::trace!(owner, count = ranges.len(), "hidden ranges updated");
        self.hidden = ranges.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_core::MAX_COLUMN;

    fn doc(text: &str) -> Document {
        Document::from_text(DocumentUri::file("/tmp/t.rs"), text)
    }

    #[test]
    fn value_in_range_counts_characters() {
        let d = doc("héllo\nwörld\n");
        assert_eq!(d.line_count(), 2);
        assert_eq!(d.value_in_range(TextRange::from_coords(1, 2, 1, 4)), "él");
        assert_eq!(d.value_in_range(TextRange::from_coords(1, 4, 2, 3)), "lo\nwö");
        assert_eq!(d.value_in_range(TextRange::from_coords(2, 1, 2, MAX_COLUMN)), "wörld");
    }

    #[test]
    fn push_edit_replaces_whole_lines_and_undoes() {
        let mut d = doc("a\n  b\n  c\nd");
        d.push_edit(TextRange::from_coords(2, 1, 3, MAX_COLUMN), "  x\n  y\n  z");

        assert_eq!(d.text(), "a\n  x\n  y\n  z\nd");
        assert_eq!(d.cursor(), TextPosition::new(4, 4));
        assert!(d.is_dirty());

        assert!(d.undo());
        assert_eq!(d.text(), "a\n  b\n  c\nd");
        assert!(!d.undo());
    }

    #[test]
    fn typing_replaces_the_selection() {
        let mut d = doc("hello world");
        d.set_cursor(TextPosition::new(1, 7), false);
        d.move_cursor(Motion::LineEnd, true);
        assert_eq!(d.selection(), Some(TextRange::from_coords(1, 7, 1, 12)));

        d.insert("there");
        assert_eq!(d.text(), "hello there");
        assert_eq!(d.selection(), None);
    }

    #[test]
    fn backspace_joins_lines() {
        let mut d = doc("ab\ncd");
        d.set_cursor(TextPosition::new(2, 1), false);
        d.backspace();
        assert_eq!(d.text(), "abcd");
        assert_eq!(d.cursor(), TextPosition::new(1, 3));

        d.delete();
        assert_eq!(d.text(), "abd");
    }

    #[test]
    fn newline_insert_moves_cursor_down() {
        let mut d = doc("ab");
        d.set_cursor(TextPosition::new(1, 2), false);
        d.insert("\n");
        assert_eq!(d.lines(), ["a", "b"]);
        assert_eq!(d.cursor(), TextPosition::new(2, 1));
    }

    #[test]
    fn collapsed_anchor_is_no_selection() {
        let mut d = doc("abc");
        d.set_cursor(TextPosition::new(1, 2), true);
        d.set_cursor(TextPosition::new(1, 1), true);
        assert_eq!(d.selection(), None);
    }

    #[test]
    fn hidden_ranges_cover_whole_lines() {
        let mut d = doc("1\n2\n3\n4");
        d.set_hidden_ranges(&[TextRange::from_coords(2, 1, 3, MAX_COLUMN)], "test");
        let hidden: Vec<u32> = (1..=4).filter(|&l| d.is_hidden(l)).collect();
        assert_eq!(hidden, [2, 3]);
    }

    #[test]
    fn save_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        std::fs::write(&path, "fn main() {}\n").unwrap();

        let mut d = Document::open(&path).unwrap();
        assert!(d.uri().is_some_and(|u| u.is_file()));
        d.set_cursor(TextPosition::new(1, MAX_COLUMN), false);
        d.insert(" // done");
        d.save().unwrap();

        assert!(!d.is_dirty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fn main() {} // done\n");
    }

    #[test]
    fn scratch_buffers_are_not_files() {
        let mut d = Document::scratch();
        assert!(!d.uri().unwrap().is_file());
        assert!(d.save().is_err());
    }
}
