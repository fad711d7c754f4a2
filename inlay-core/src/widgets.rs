//! Widget contracts and the lifecycle manager that owns widget instances.
//!
//! The manager holds zero-or-one content widget and zero-or-one diff widget per
//! editor, plus the two wiring scopes that decide which user reactions are live:
//!
//! - the **session scope** exists from a successful trigger until full reset and
//!   carries the discard/regenerate wiring once an action with a diff strategy
//!   has been picked;
//! - the **operation scope** exists from a shown diff until the next attempt and
//!   carries the accept and overflow wiring for that one diff.
//!
//! Disposal is `take()`-then-dispose everywhere, so tearing down from inside a
//! reaction to one of the widgets being torn down is safe and a second reset is
//! a no-op.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::editor::{Capabilities, EditorSurface, DIFF_HIDDEN_RANGE_OWNER};
use crate::registry::{DiffPreviewStrategy, InlineChatAction};
use crate::status::ChatStatusMachine;
use crate::text::is_blank;
use crate::types::{InvocationTicket, SessionId, TextPosition, TextRange};

/// Something with an explicit release step.
pub trait Disposable {
    fn dispose(&mut self);
}

/// The chat affordance: action list, status and accept/regenerate/discard
/// controls. Rendering is the host's business.
pub trait ContentWidget: Disposable {
    /// Shows the widget anchored at `selection` listing `actions`.
    fn show(&mut self, selection: TextRange, actions: &[InlineChatAction]);

    /// Moves the widget to `position` and re-lays it out.
    fn set_position(&mut self, position: TextPosition);

    /// Pushes the widget down by `offset` layout units.
    fn offset_top(&mut self, offset: u32);
}

/// Overlay showing a proposed replacement against the hidden original text.
pub trait DiffWidget: Disposable {
    /// Renders the overlay starting after 0-based line `line` and spanning
    /// `height` lines.
    fn show_by_line(&mut self, line: u32, height: u32);
}

/// Creates the host's concrete widgets.
pub trait WidgetFactory {
    type Content: ContentWidget;
    type Diff: DiffWidget;

    fn content_widget(&mut self, editor: &dyn EditorSurface) -> Self::Content;

    fn diff_widget(
        &mut self,
        editor: &dyn EditorSurface,
        range: TextRange,
        original: &str,
        proposed: &str,
    ) -> Self::Diff;
}

/// Owns at most one widget and disposes it exactly once.
#[derive(Debug)]
pub struct WidgetSlot<W: Disposable> {
    widget: Option<W>,
}

impl<W: Disposable> WidgetSlot<W> {
    pub fn empty() -> Self {
        Self { widget: None }
    }

    /// Disposes the current widget (if any) and stores `widget`.
    pub fn replace(&mut self, widget: W) -> &mut W {
        self.clear();
        self.widget.insert(widget)
    }

    /// Disposes the current widget. Safe to call on an empty slot.
    pub fn clear(&mut self) {
        if let Some(mut widget) = self.widget.take() {
            widget.dispose();
        }
    }

    pub fn get(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut W> {
        self.widget.as_mut()
    }

    pub fn is_live(&self) -> bool {
        self.widget.is_some()
    }
}

impl<W: Disposable> Default for WidgetSlot<W> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<W: Disposable> Drop for WidgetSlot<W> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Discard/regenerate wiring bound to the action the user picked.
#[derive(Clone)]
pub struct DiffWiring {
    pub action_id: String,
    pub strategy: Arc<dyn DiffPreviewStrategy>,
    pub cross_selection: TextRange,
}

/// A strategy call that has been started and not yet completed.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub ticket: InvocationTicket,
    pub cross_selection: TextRange,
    /// Original text under `cross_selection`, kept for re-indentation.
    pub cross_text: String,
}

/// Everything that lives from a successful trigger until full reset.
pub struct SessionScope {
    pub id: SessionId,
    pub selection: TextRange,
    pub wiring: Option<DiffWiring>,
    pub in_flight: Option<InFlight>,
}

/// Reactions bound to one shown diff.
#[derive(Debug, Clone)]
pub struct OperationScope {
    pub ticket: InvocationTicket,
    pub cross_selection: TextRange,
    /// The re-indented answer the accept reaction will write.
    pub answer: String,
}

/// Owns the widgets, wiring scopes, hidden-range state and session token of
/// one editor.
pub struct WidgetLifecycleManager<F: WidgetFactory> {
    factory: F,
    content: WidgetSlot<F::Content>,
    diff: WidgetSlot<F::Diff>,
    session: Option<SessionScope>,
    operation: Option<OperationScope>,
    hidden: Option<TextRange>,
    token: CancellationToken,
}

impl<F: WidgetFactory> WidgetLifecycleManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            content: WidgetSlot::empty(),
            diff: WidgetSlot::empty(),
            session: None,
            operation: None,
            hidden: None,
            token: CancellationToken::new(),
        }
    }

    /// Tears down both widgets and both scopes and fires the session token.
    ///
    /// Idempotent: calling it with nothing open only swaps in a fresh token.
    pub fn reset_all(&mut self, editor: &mut dyn EditorSurface) {
        self.clear_hidden(editor);
        self.release();
    }

    /// Editor-free part of [`reset_all`](Self::reset_all), also used on drop.
    pub(crate) fn release(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(session = %session.id, "inline chat session closed");
        }
        self.diff.clear();
        self.content.clear();
        self.operation = None;
        self.token.cancel();
        self.token = CancellationToken::new();
    }

    /// Disposes the diff widget and the operation scope, keeping the content
    /// widget and the session.
    pub fn reset_diff_environment(&mut self, editor: &mut dyn EditorSurface) {
        self.diff.clear();
        self.operation = None;
        self.clear_hidden(editor);
    }

    /// Opens the chat affordance for the editor's current selection.
    ///
    /// Preconditions: capability enabled, local file, non-blank selection.
    /// Any failed precondition resets everything and returns `None`; that is
    /// the normal "nothing to show" path. On success the status is READY, a
    /// fresh session scope exists and exactly one content widget is shown.
    pub fn open_content_widget(
        &mut self,
        editor: &mut dyn EditorSurface,
        capabilities: Capabilities,
        status: &ChatStatusMachine,
        actions: &[InlineChatAction],
    ) -> Option<SessionId> {
        self.reset_all(editor);
        status.reset();

        if !capabilities.supports_inline_chat {
            return None;
        }
        if !editor.uri().is_some_and(|uri| uri.is_file()) {
            return None;
        }
        let selection = editor.selection()?;
        if is_blank(&editor.value_in_range(selection)) {
            return None;
        }

        let id = SessionId::new();
        let mut widget = self.factory.content_widget(editor);
        widget.show(selection, actions);
        self.content.replace(widget);
        self.session = Some(SessionScope { id, selection, wiring: None, in_flight: None });
        tracing::debug!(
            session = %id,
            start_line = selection.start_line(),
            end_line = selection.end_line(),
            "inline chat session opened"
        );
        Some(id)
    }

    /// Shows (or replaces) the diff widget over `cross_selection`.
    ///
    /// Hides the original range, creates the diff widget over exactly that
    /// range and moves the content widget to the line right below it. Callable
    /// repeatedly; the content widget survives.
    pub fn open_or_update_diff_widget(
        &mut self,
        editor: &mut dyn EditorSurface,
        cross_selection: TextRange,
        original: &str,
        answer: &str,
    ) {
        self.reset_diff_environment(editor);

        editor.set_hidden_ranges(&[cross_selection], DIFF_HIDDEN_RANGE_OWNER);
        self.hidden = Some(cross_selection);

        let mut widget = self.factory.diff_widget(editor, cross_selection, original, answer);
        widget.show_by_line(
            cross_selection.start_line().saturating_sub(1),
            cross_selection.line_span() + 1,
        );
        self.diff.replace(widget);

        if let Some(content) = self.content.get_mut() {
            content.set_position(TextPosition::new(cross_selection.end_line() + 1, 1));
        }
    }

    fn clear_hidden(&mut self, editor: &mut dyn EditorSurface) {
        if self.hidden.take().is_some() {
            editor.set_hidden_ranges(&[], DIFF_HIDDEN_RANGE_OWNER);
        }
    }

    /// Clone of the current session token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn session(&self) -> Option<&SessionScope> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut SessionScope> {
        self.session.as_mut()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn operation(&self) -> Option<&OperationScope> {
        self.operation.as_ref()
    }

    pub(crate) fn set_operation(&mut self, scope: OperationScope) {
        self.operation = Some(scope);
    }

    pub(crate) fn take_operation(&mut self) -> Option<OperationScope> {
        self.operation.take()
    }

    pub fn content_widget(&self) -> Option<&F::Content> {
        self.content.get()
    }

    pub fn content_widget_mut(&mut self) -> Option<&mut F::Content> {
        self.content.get_mut()
    }

    pub fn diff_widget(&self) -> Option<&F::Diff> {
        self.diff.get()
    }

    pub fn diff_widget_mut(&mut self) -> Option<&mut F::Diff> {
        self.diff.get_mut()
    }

    pub fn hidden_range(&self) -> Option<TextRange> {
        self.hidden
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: WidgetFactory> Drop for WidgetLifecycleManager<F> {
    fn drop(&mut self) {
        self.release();
    }
}
