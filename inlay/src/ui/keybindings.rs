//! Keybinding dispatcher for inlay.
//!
//! Translates raw crossterm key and mouse events into `AppState` mutations and
//! returns a `KeyAction` telling the event loop whether to continue or quit.
//! The dispatcher branches first on `state.mode` so that every mode has an
//! isolated handler. While an inline chat session is open, Normal mode routes
//! the chat keys (`1`-`9`, Enter, `r`, Esc) to the engine before anything else.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use inlay_core::{EditorEvent, EditorSurface, TextPosition, WidgetEvent};
use ratatui::layout::Position;

use crate::app::{AppState, ChatHit, Mode};
use crate::document::{Document, Motion};

/// Wheel scroll distance in rows.
const WHEEL_ROWS: isize = 3;

/// Control-flow signal returned from the dispatchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Keep running and redraw.
    Continue,
    /// Exit cleanly.
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// # Arguments
///
/// * `key`   - the raw crossterm key event (code + modifiers)
/// * `state` - mutable reference to all UI state
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Menu => handle_menu(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::Insert => handle_insert(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if state.chat_open() {
        if let Some(action) = handle_chat_key(key, state) {
            return action;
        }
    }
    if let Some(action) = handle_command_key(key, state) {
        return action;
    }
    if let Some(action) = handle_motion_key(key, state, true) {
        return action;
    }

    match key.code {
        KeyCode::Char('i') => state.mode = Mode::Insert,
        // Select the cursor line, or grow the selection by one line.
        KeyCode::Char('x') => {
            state.with_selection(|doc| {
                if doc.selection().is_none() {
                    doc.move_cursor(Motion::LineStart, false);
                } else {
                    doc.move_cursor(Motion::Down, true);
                }
                doc.move_cursor(Motion::LineEnd, true);
            });
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') => return request_quit(state),
        KeyCode::Esc => {
            state.with_selection(Document::clear_selection);
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Keys that act on an open inline chat session.
///
/// Returns `None` when the key is not a chat key.
fn handle_chat_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    let event = match key.code {
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            let id = state
                .chat
                .widgets()
                .content_widget()
                .and_then(|widget| widget.actions.get(index))
                .map(|action| action.id.clone())?;
            WidgetEvent::ActionClicked(id)
        }
        KeyCode::Enter | KeyCode::Char('a') => WidgetEvent::Accept,
        KeyCode::Char('r') => WidgetEvent::Regenerate,
        KeyCode::Esc | KeyCode::Char('d') => WidgetEvent::Discard,
        _ => return None,
    };
    state.widget_event(event);
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_command_key(key, state) {
        return action;
    }
    if let Some(action) = handle_motion_key(key, state, false) {
        return action;
    }

    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter => state.type_text("\n"),
        KeyCode::Tab => state.type_text("    "),
        KeyCode::Backspace => state.delete_backward(),
        KeyCode::Delete => state.delete_forward(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.type_text(c.encode_utf8(&mut [0; 4]));
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Shared by Normal and Insert
// ---------------------------------------------------------------------------

/// Ctrl chords available in both editing modes.
fn handle_command_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('q') => return Some(request_quit(state)),
        KeyCode::Char('k') => state.show_inline_chat(),
        KeyCode::Char('t') => state.toggle_auto_show(),
        KeyCode::Char('z') => state.undo(),
        KeyCode::Char('s') => state.save(),
        KeyCode::Char('r') => state.reload(),
        KeyCode::Char('a') => {
            state.with_selection(Document::select_all);
        }
        KeyCode::Char('d') => move_lines(state, half_page(state), Motion::Down),
        KeyCode::Char('u') => move_lines(state, half_page(state), Motion::Up),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

/// Cursor motion keys. Shift extends the selection. `vi_keys` also enables
/// h/j/k/l and g/G.
fn handle_motion_key(key: KeyEvent, state: &mut AppState, vi_keys: bool) -> Option<KeyAction> {
    let extend = key.modifiers.contains(KeyModifiers::SHIFT);
    let motion = match key.code {
        KeyCode::Left => Motion::Left,
        KeyCode::Right => Motion::Right,
        KeyCode::Up => Motion::Up,
        KeyCode::Down => Motion::Down,
        KeyCode::Home => Motion::LineStart,
        KeyCode::End => Motion::LineEnd,
        KeyCode::PageDown => {
            move_lines(state, page(state), Motion::Down);
            return Some(KeyAction::Continue);
        }
        KeyCode::PageUp => {
            move_lines(state, page(state), Motion::Up);
            return Some(KeyAction::Continue);
        }
        KeyCode::Char('h') if vi_keys => Motion::Left,
        KeyCode::Char('l') if vi_keys => Motion::Right,
        KeyCode::Char('k') if vi_keys => Motion::Up,
        KeyCode::Char('j') if vi_keys => Motion::Down,
        KeyCode::Char('g') if vi_keys => {
            state.with_selection(|doc| doc.set_cursor(TextPosition::new(1, 1), false));
            return Some(KeyAction::Continue);
        }
        KeyCode::Char('G') if vi_keys => {
            let last = state.document.lines().len() as u32;
            state.with_selection(|doc| {
                doc.set_cursor(TextPosition::new(last, 1), false);
            });
            return Some(KeyAction::Continue);
        }
        _ => return None,
    };
    state.with_selection(|doc| doc.move_cursor(motion, extend));
    Some(KeyAction::Continue)
}

fn page(state: &AppState) -> usize {
    state.viewport_rows().max(1)
}

fn half_page(state: &AppState) -> usize {
    (state.viewport_rows() / 2).max(1)
}

fn move_lines(state: &mut AppState, count: usize, motion: Motion) {
    state.with_selection(|doc| {
        for _ in 0..count {
            doc.move_cursor(motion, false);
        }
    });
}

/// Quits straight away, or asks first when the buffer has unsaved edits.
fn request_quit(state: &mut AppState) -> KeyAction {
    if state.document.is_dirty() {
        state.mode = Mode::ConfirmQuit;
        KeyAction::Continue
    } else {
        KeyAction::Quit
    }
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_menu(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.chat.context_menu_mut().move_highlight(1),
        KeyCode::Char('k') | KeyCode::Up => state.chat.context_menu_mut().move_highlight(-1),
        KeyCode::Enter => {
            state.chat.context_menu_mut().choose_highlighted();
            state.sync_menu_mode();
        }
        KeyCode::Esc | KeyCode::Char('q') => state.dismiss_menu(),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse
// ---------------------------------------------------------------------------

/// Dispatches a mouse event.
///
/// Left press and release are reported to the inline chat engine, with the
/// release flagged when the press started on the chat widget. Dragging
/// extends the selection. Right click opens the context menu and the wheel
/// scrolls by three rows.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    if matches!(state.mode, Mode::HelpOverlay | Mode::ConfirmQuit) {
        return KeyAction::Continue;
    }
    let pos = Position::new(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if state.mode == Mode::Menu {
                match state.chat.context_menu().item_at(pos) {
                    Some(item) => {
                        state.chat.context_menu_mut().choose(item);
                        state.sync_menu_mode();
                    }
                    None => state.dismiss_menu(),
                }
                return KeyAction::Continue;
            }

            state.editor_event(EditorEvent::MouseDown);
            if state.chat_area.contains(pos) {
                state.pressed_on_chat = true;
                let hit = state
                    .chat_hitboxes
                    .iter()
                    .find(|(area, _)| area.contains(pos))
                    .map(|(_, hit)| hit.clone());
                if let Some(hit) = hit {
                    state.widget_event(match hit {
                        ChatHit::Action(id) => WidgetEvent::ActionClicked(id),
                        ChatHit::Accept => WidgetEvent::Accept,
                        ChatHit::Regenerate => WidgetEvent::Regenerate,
                        ChatHit::Discard => WidgetEvent::Discard,
                    });
                }
            } else if let Some(target) = state.position_at(mouse.column, mouse.row) {
                let extend = mouse.modifiers.contains(KeyModifiers::SHIFT);
                state.dragging = true;
                state.with_selection(|doc| doc.set_cursor(target, extend));
            }
        }
        MouseEventKind::Drag(MouseButton::Left) if state.dragging => {
            if let Some(target) = state.position_at(mouse.column, mouse.row) {
                state.with_selection(|doc| doc.set_cursor(target, true));
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let on_chat_widget = state.pressed_on_chat || state.chat_area.contains(pos);
            state.dragging = false;
            state.pressed_on_chat = false;
            state.editor_event(EditorEvent::MouseUp { on_chat_widget });
        }
        MouseEventKind::Down(MouseButton::Right) => state.open_menu(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => state.scroll_by(WHEEL_ROWS),
        MouseEventKind::ScrollUp => state.scroll_by(-WHEEL_ROWS),
        _ => {}
    }
    KeyAction::Continue
}
