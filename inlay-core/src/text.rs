//! Pure range and text helpers.
//!
//! Nothing here touches an editor or widget; every function is deterministic
//! so the orchestrator's text bookkeeping can be tested in isolation.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{TextPosition, TextRange, MAX_COLUMN};

/// First fenced code block: optional word-character language tag after the
/// opening fence, lazy interior, trailing whitespace before the closing fence
/// excluded.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```\w*(.+?)\s*```").expect("fenced block pattern is valid")
});

/// Expands `selection` to whole lines: column 1 of its first line through the
/// end-of-line sentinel of its last line.
///
/// The result always contains `selection` and is always line-aligned.
pub fn expand_to_lines(selection: TextRange) -> TextRange {
    TextRange {
        start: TextPosition::new(selection.start.line, 1),
        end: TextPosition::new(selection.end.line, MAX_COLUMN),
    }
}

/// Returns `true` when `text` is empty or whitespace only.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Pulls the answer out of a raw strategy reply.
///
/// When the reply contains a fenced code block the answer is the trimmed
/// interior of the first one; otherwise it is the whole reply, trimmed.
/// Returns `None` when the result is empty.
pub fn extract_answer(reply: &str) -> Option<String> {
    let answer = match FENCED_BLOCK.captures(reply).and_then(|c| c.get(1)) {
        Some(interior) => interior.as_str().trim(),
        None => reply.trim(),
    };
    if answer.is_empty() {
        None
    } else {
        Some(answer.to_owned())
    }
}

/// Leading horizontal whitespace (spaces and tabs) of `text`.
///
/// Stops at the first newline so a selection starting with a blank line does
/// not smuggle line breaks into the indent.
pub fn leading_whitespace(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|&(_, c)| !(c == ' ' || c == '\t'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

/// Re-indents `answer` to match the block it replaces.
///
/// Every line after the first is prefixed with the leading whitespace of
/// `original`. The first line is left alone because it is written in place of
/// the original first line, which already sits at that column.
pub fn format_answer(answer: &str, original: &str) -> String {
    let indent = leading_whitespace(original);
    answer
        .split('\n')
        .enumerate()
        .map(|(i, line)| if i == 0 { line.to_owned() } else { format!("{indent}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_single_line_selection() {
        let selection = TextRange::from_coords(3, 3, 3, 12);
        let cross = expand_to_lines(selection);
        assert_eq!(cross, TextRange::from_coords(3, 1, 3, MAX_COLUMN));
        assert!(cross.contains_range(&selection));
        assert!(cross.is_line_aligned());
    }

    #[test]
    fn expands_multi_line_selection() {
        let selection = TextRange::from_coords(7, 5, 2, 9);
        let cross = expand_to_lines(selection);
        assert_eq!(cross.start, TextPosition::new(2, 1));
        assert_eq!(cross.end, TextPosition::new(7, MAX_COLUMN));
    }

    #[test]
    fn extracts_first_fenced_block() {
        assert_eq!(
            extract_answer("prefix ```ts\nCONST\n``` suffix").as_deref(),
            Some("CONST")
        );
        assert_eq!(
            extract_answer("```rust\nlet a = 1;\n```\nand\n```\nlet b = 2;\n```").as_deref(),
            Some("let a = 1;")
        );
    }

    #[test]
    fn falls_back_to_trimmed_reply() {
        assert_eq!(extract_answer("  x + 1 \n").as_deref(), Some("x + 1"));
    }

    #[test]
    fn empty_replies_yield_nothing() {
        assert_eq!(extract_answer("   \n\t"), None);
        assert_eq!(extract_answer("```\n```"), None);
    }

    #[test]
    fn single_line_answers_keep_their_shape() {
        assert_eq!(format_answer("return y;", "        return x;"), "return y;");
        assert_eq!(format_answer("return y;", "return x;"), "return y;");
    }

    #[test]
    fn later_lines_receive_the_original_indent() {
        let original = "    if a {\n        b();\n    }";
        let answer = "if a {\n    c();\n}";
        assert_eq!(
            format_answer(answer, original),
            "if a {\n        c();\n    }"
        );
    }

    #[test]
    fn leading_whitespace_stops_at_newline() {
        assert_eq!(leading_whitespace("\t  x"), "\t  ");
        assert_eq!(leading_whitespace("  \n  x"), "  ");
        assert_eq!(leading_whitespace("x"), "");
        assert_eq!(leading_whitespace("   "), "   ");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \n\t "));
        assert!(!is_blank("  a "));
    }
}
