//! Renders an inline chat proposal as a highlighted line diff.
//!
//! `similar` computes the line diff of the hidden original against the
//! proposed replacement; each side is syntax highlighted with `syntect`, and a
//! removed line directly followed by an added line gets word-level emphasis.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use similar::{ChangeTag, TextDiff};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;

use crate::theme::Theme;

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Forces the syntax and theme sets to load, so the first diff does not pay
/// for it. Called once at startup.
pub fn warm_up() {
    let _ = &*PS;
    let _ = &*TS;
}

/// Converts a syntect (Style, &str) pair to an owned ratatui Span.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    use syntect::highlighting::{Color as SC, FontStyle};
    let to_color = |c: SC| (c.a > 0).then_some(Color::Rgb(c.r, c.g, c.b));
    let mut ratatui_style = Style::default();
    if let Some(fg) = to_color(style.foreground) {
        ratatui_style = ratatui_style.fg(fg);
    }
    if style.font_style.contains(FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    Span::styled(content.to_owned(), ratatui_style)
}

/// Syntax-highlighted spans for one line; a plain span on failure.
fn build_syntect_spans(code: &str, h: &mut Option<HighlightLines<'_>>) -> Vec<Span<'static>> {
    let spans: Vec<Span<'static>> = h
        .as_mut()
        .and_then(|h| h.highlight_line(code, &PS).ok())
        .unwrap_or_default()
        .into_iter()
        .map(|(style, text)| syntect_to_span(style, text))
        .collect();
    if spans.is_empty() {
        vec![Span::raw(code.to_owned())]
    } else {
        spans
    }
}

/// Word-level diff spans for a removed/added line pair. Changed words are bold.
fn word_diff_spans(
    old_line: &str,
    new_line: &str,
    theme: &Theme,
) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
    let diff = TextDiff::from_words(old_line, new_line);
    let mut old_spans = Vec::new();
    let mut new_spans = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let text = value.into_owned();
                let emphasis = |color: Color| {
                    let style = Style::default().fg(color);
                    if emphasized { style.add_modifier(Modifier::BOLD) } else { style }
                };
                match change.tag() {
                    ChangeTag::Delete => old_spans.push(Span::styled(text, emphasis(theme.diff_removed))),
                    ChangeTag::Insert => new_spans.push(Span::styled(text, emphasis(theme.diff_added))),
                    ChangeTag::Equal => {
                        let span = Span::styled(text, Style::default().fg(theme.diff_context));
                        old_spans.push(span.clone());
                        new_spans.push(span);
                    }
                }
            }
        }
    }
    (old_spans, new_spans)
}

fn marker(tag: ChangeTag, theme: &Theme) -> Span<'static> {
    match tag {
        ChangeTag::Delete => Span::styled("- ", Style::default().fg(theme.diff_removed)),
        ChangeTag::Insert => Span::styled("+ ", Style::default().fg(theme.diff_added)),
        ChangeTag::Equal => Span::styled("  ", Style::default().fg(theme.diff_context)),
    }
}

fn with_marker(tag: ChangeTag, spans: Vec<Span<'static>>, theme: &Theme) -> Line<'static> {
    let mut line = vec![marker(tag, theme)];
    line.extend(spans);
    Line::from(line)
}

fn terminated(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_owned()
    } else {
        format!("{text}\n")
    }
}

/// Builds the overlay lines for `original` → `proposed`.
///
/// # Arguments
///
/// * `original` - text under the hidden range
/// * `proposed` - replacement the accept reaction would write
/// * `extension` - file extension used to pick the syntax, if any
/// * `theme` - active color theme
pub fn diff_lines(
    original: &str,
    proposed: &str,
    extension: Option<&str>,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let syntax = extension
        .and_then(|ext| PS.find_syntax_by_extension(ext))
        .unwrap_or_else(|| PS.find_syntax_plain_text());
    let highlighting = TS.themes.get("base16-ocean.dark").or_else(|| TS.themes.values().next());
    // Separate highlighter state per side: each is a coherent piece of code.
    let mut old_h = highlighting.map(|t| HighlightLines::new(syntax, t));
    let mut new_h = highlighting.map(|t| HighlightLines::new(syntax, t));

    // Line diffs compare terminators too; the last line of either side must
    // not differ from its twin only by a missing newline.
    let original = terminated(original);
    let proposed = terminated(proposed);
    let diff = TextDiff::from_lines(&original, &proposed);
    let mut out = Vec::new();
    let mut pending_removed: Option<(String, Vec<Span<'static>>)> = None;

    for change in diff.iter_all_changes() {
        let code = change.as_str().unwrap_or_default().trim_end_matches('\n');
        match change.tag() {
            ChangeTag::Delete => {
                if let Some((_, spans)) = pending_removed.take() {
                    out.push(with_marker(ChangeTag::Delete, spans, theme));
                }
                let spans = build_syntect_spans(code, &mut old_h);
                pending_removed = Some((code.to_owned(), spans));
            }
            ChangeTag::Insert => {
                let spans = build_syntect_spans(code, &mut new_h);
                match pending_removed.take() {
                    Some((old_code, _)) => {
                        let (old_words, new_words) = word_diff_spans(&old_code, code, theme);
                        out.push(with_marker(ChangeTag::Delete, old_words, theme));
                        out.push(with_marker(ChangeTag::Insert, new_words, theme));
                    }
                    None => out.push(with_marker(ChangeTag::Insert, spans, theme)),
                }
            }
            ChangeTag::Equal => {
                if let Some((_, spans)) = pending_removed.take() {
                    out.push(with_marker(ChangeTag::Delete, spans, theme));
                }
                // Keep both highlighters in step with the shared line.
                let _ = build_syntect_spans(code, &mut old_h);
                let spans = build_syntect_spans(code, &mut new_h);
                out.push(with_marker(ChangeTag::Equal, spans, theme));
            }
        }
    }
    if let Some((_, spans)) = pending_removed.take() {
        out.push(with_marker(ChangeTag::Delete, spans, theme));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn pairs_changed_lines_and_keeps_context() {
        let theme = Theme::dark();
        let lines = diff_lines("let a = 1;\nlet b = 2;", "let a = 1;\nlet b = 3;", Some("rs"), &theme);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, ["  let a = 1;", "- let b = 2;", "+ let b = 3;"]);
    }

    #[test]
    fn pure_insertions_and_unknown_extensions() {
        let theme = Theme::dark();
        let lines = diff_lines("a", "a\nb\nc", Some("no-such-ext"), &theme);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, ["  a", "+ b", "+ c"]);
    }
}
