//! Diff preview orchestration: run a strategy, interpret its outcome, show the
//! diff and wire the accept/regenerate reactions.
//!
//! A run is split in two halves around the only suspension point. [`run`]
//! snapshots the editor, moves the status to THINKING and spawns the strategy
//! on tokio; the spawned task reports back through the engine event channel
//! and the host feeds that event into [`complete`] from its own loop. Between
//! the halves anything may happen (model change, new trigger, discard), which
//! is why `complete` checks the invocation ticket against the live session
//! before touching anything.
//!
//! [`run`]: DiffPreviewOrchestrator::run
//! [`complete`]: DiffPreviewOrchestrator::complete

use tokio::sync::mpsc::UnboundedSender;

use crate::editor::EditorSurface;
use crate::error::InlineChatError;
use crate::registry::StrategyRequest;
use crate::status::ChatStatusMachine;
use crate::text::{extract_answer, format_answer};
use crate::types::{ChatStatus, InvocationTicket, SessionId, StrategyResponse};
use crate::widgets::{
    ContentWidget, DiffWiring, InFlight, OperationScope, WidgetFactory, WidgetLifecycleManager,
};

/// Extra push applied on top of the overflow height when nudging the content
/// widget below a diff that runs past the end of the document.
pub const DEFAULT_OVERFLOW_PADDING: u32 = 12;

/// Results the engine posts to itself through the host's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A spawned strategy call resolved.
    StrategyFinished { ticket: InvocationTicket, response: StrategyResponse },
    /// Deferred teardown scheduled by an accept.
    IdleReset { session: SessionId },
}

pub struct DiffPreviewOrchestrator {
    events: UnboundedSender<EngineEvent>,
    next_seq: u64,
    overflow_padding: u32,
}

impl DiffPreviewOrchestrator {
    pub fn new(events: UnboundedSender<EngineEvent>, overflow_padding: u32) -> Self {
        Self { events, next_seq: 0, overflow_padding }
    }

    /// Starts a strategy call for the session's wiring.
    ///
    /// Returns the ticket of the spawned call, or `None` when there is nothing
    /// to run against (no model, no session, or no runtime to spawn on).
    pub fn run<F: WidgetFactory>(
        &mut self,
        editor: &mut dyn EditorSurface,
        manager: &mut WidgetLifecycleManager<F>,
        status: &ChatStatusMachine,
        wiring: &DiffWiring,
    ) -> Result<Option<InvocationTicket>, InlineChatError> {
        if !editor.has_model() {
            return Ok(None);
        }
        let Some(session) = manager.session() else {
            return Ok(None);
        };
        let selection = session.selection;
        let session_id = session.id;

        manager.reset_diff_environment(editor);

        let cross_selection = wiring.cross_selection;
        let cross_text = editor.value_in_range(cross_selection);
        status.transition(ChatStatus::Thinking)?;

        self.next_seq += 1;
        let ticket = InvocationTicket { session: session_id, seq: self.next_seq };
        let request = StrategyRequest {
            action_id: wiring.action_id.clone(),
            uri: editor.uri(),
            selection,
            cross_selection,
            cross_text: cross_text.clone(),
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime; inline chat strategy not started");
            status.reset();
            return Ok(None);
        };

        if let Some(session) = manager.session_mut() {
            session.in_flight = Some(InFlight { ticket, cross_selection, cross_text });
        }

        let pending = wiring.strategy.provide(request, manager.token());
        let events = self.events.clone();
        runtime.spawn(async move {
            let response = pending.await;
            // A closed channel means the host is gone; nothing left to notify.
            let _ = events.send(EngineEvent::StrategyFinished { ticket, response });
        });

        tracing::debug!(
            session = %session_id,
            seq = ticket.seq,
            action = %wiring.action_id,
            "diff preview strategy started"
        );
        Ok(Some(ticket))
    }

    /// Applies a strategy outcome.
    ///
    /// Results whose session was torn down (or superseded) while pending are
    /// dropped without touching widgets; the status is only forced back to
    /// READY when no session is open at all, so a newer session keeps its own
    /// state.
    pub fn complete<F: WidgetFactory>(
        &mut self,
        editor: &mut dyn EditorSurface,
        manager: &mut WidgetLifecycleManager<F>,
        status: &ChatStatusMachine,
        ticket: InvocationTicket,
        response: StrategyResponse,
    ) -> Result<(), InlineChatError> {
        let in_flight = match manager.session_mut() {
            Some(session) if session.in_flight.as_ref().is_some_and(|f| f.ticket == ticket) => {
                session.in_flight.take()
            }
            Some(_) => None,
            None => {
                status.reset();
                None
            }
        };
        let Some(in_flight) = in_flight else {
            tracing::trace!(seq = ticket.seq, "dropping stale strategy result");
            return Ok(());
        };

        match response {
            StrategyResponse::Cancel => {
                status.reset();
                Ok(())
            }
            StrategyResponse::Error(message) => {
                tracing::warn!(session = %ticket.session, %message, "diff preview strategy failed");
                status.transition(ChatStatus::Error)
            }
            StrategyResponse::Reply(text) => {
                let Some(answer) = extract_answer(&text) else {
                    tracing::info!(session = %ticket.session, "strategy reply had no usable answer");
                    return status.transition(ChatStatus::Error);
                };
                status.transition(ChatStatus::Done)?;

                let answer = format_answer(&answer, &in_flight.cross_text);
                manager.open_or_update_diff_widget(
                    editor,
                    in_flight.cross_selection,
                    &in_flight.cross_text,
                    &answer,
                );
                manager.set_operation(OperationScope {
                    ticket,
                    cross_selection: in_flight.cross_selection,
                    answer,
                });
                Ok(())
            }
        }
    }

    /// Writes the pending answer over the cross selection and schedules the
    /// deferred full reset. Only acts when the status is DONE and a diff
    /// operation is live; a second accept finds no operation and does nothing.
    pub fn accept<F: WidgetFactory>(
        &mut self,
        editor: &mut dyn EditorSurface,
        manager: &mut WidgetLifecycleManager<F>,
        status: &ChatStatusMachine,
    ) -> Result<bool, InlineChatError> {
        if status.current() != ChatStatus::Done {
            return Ok(false);
        }
        let Some(operation) = manager.take_operation() else {
            return Ok(false);
        };

        editor.push_edit(operation.cross_selection, &operation.answer);
        tracing::info!(
            session = %operation.ticket.session,
            start_line = operation.cross_selection.start_line(),
            end_line = operation.cross_selection.end_line(),
            "inline chat answer accepted"
        );

        self.events
            .send(EngineEvent::IdleReset { session: operation.ticket.session })
            .map_err(|_| InlineChatError::ChannelClosed)?;
        Ok(true)
    }

    /// Re-runs the session's strategy over the same cross selection.
    pub fn regenerate<F: WidgetFactory>(
        &mut self,
        editor: &mut dyn EditorSurface,
        manager: &mut WidgetLifecycleManager<F>,
        status: &ChatStatusMachine,
    ) -> Result<Option<InvocationTicket>, InlineChatError> {
        let Some(wiring) = manager.session().and_then(|s| s.wiring.clone()) else {
            return Ok(None);
        };
        if !matches!(status.current(), ChatStatus::Done | ChatStatus::Error) {
            tracing::debug!(status = %status.current(), "regenerate ignored");
            return Ok(None);
        }
        self.run(editor, manager, status, &wiring)
    }

    /// Reacts to the diff widget growing `overflow` lines past its limit.
    ///
    /// Only when the diff ends on the document's last line is the content
    /// widget pushed down, since otherwise the following lines already make
    /// room for it.
    pub fn nudge_for_overflow<F: WidgetFactory>(
        &self,
        editor: &dyn EditorSurface,
        manager: &mut WidgetLifecycleManager<F>,
        overflow: u32,
    ) {
        let Some(operation) = manager.operation() else {
            return;
        };
        if operation.cross_selection.end_line() != editor.line_count() {
            return;
        }
        let offset = editor.line_height() * overflow + self.overflow_padding;
        if let Some(content) = manager.content_widget_mut() {
            content.offset_top(offset);
        }
    }
}
