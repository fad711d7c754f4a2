//! Strategy runs, outcome handling, accept/regenerate and the stale-result
//! guard, driven through in-memory fakes on a tokio runtime.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use inlay_core::{
    CancellationToken, ChatStatus, EditorEvent, EngineEvent, FeatureRegistry, InlineChatAction,
    InlineChatHandler, StrategyRequest, StrategyResponse, TextPosition, TextRange, WidgetEvent,
    MAX_COLUMN,
};
use support::Harness;
use tokio::time::Instant;

const REPLY: &str = "Here you go:\n```rust\nlet x = 2;\nlet y = 3;\n```\nanything else?";

fn reply_with(reply: &'static str) -> InlineChatHandler {
    InlineChatHandler::diff_preview(move |_request: StrategyRequest, _token: CancellationToken| async move {
        StrategyResponse::reply(reply)
    })
}

/// Resolves only once the session token fires, with a reply that must never
/// reach the screen.
fn until_cancelled() -> InlineChatHandler {
    InlineChatHandler::diff_preview(|_request: StrategyRequest, token: CancellationToken| async move {
        token.cancelled().await;
        StrategyResponse::reply("```\nlate answer\n```")
    })
}

fn registry_with(id: &str, handler: InlineChatHandler) -> FeatureRegistry {
    let mut registry = FeatureRegistry::new();
    registry.register(InlineChatAction::new(id, id), handler);
    registry
}

/// Opens a session over `let x = 1;` and clicks `action`.
fn start(h: &mut Harness, action: &str) {
    h.editor.select(2, 5, 2, 15);
    assert!(h.chat.trigger(&mut h.editor).is_some());
    h.chat
        .handle_widget_event(&mut h.editor, WidgetEvent::ActionClicked(action.into()));
}

#[tokio::test]
async fn reply_shows_a_diff_over_whole_lines() {
    let mut h = Harness::new(registry_with("rewrite", reply_with(REPLY)));
    let mut status = h.chat.subscribe_status();
    start(&mut h, "rewrite");
    assert_eq!(*status.borrow_and_update(), ChatStatus::Thinking);

    h.pump().await;

    assert_eq!(*status.borrow_and_update(), ChatStatus::Done);
    let cross = TextRange::from_coords(2, 1, 2, MAX_COLUMN);
    assert_eq!(h.editor.hidden, [cross]);
    assert_eq!(h.chat.widgets().hidden_range(), Some(cross));

    let log = h.log.borrow();
    assert_eq!(log.diff_created, 1);
    assert_eq!(log.diff_range, Some(cross));
    assert_eq!(log.diff_original.as_deref(), Some("    let x = 1;"));
    assert_eq!(log.diff_proposed.as_deref(), Some("let x = 2;\n    let y = 3;"));
    assert_eq!(log.show_by_line, Some((1, 2)));
    assert_eq!(log.content_position, Some(TextPosition::new(3, 1)));
    assert_eq!(log.content_live, 1);
}

#[tokio::test]
async fn strategy_sees_the_cross_selection_snapshot() {
    let seen = Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&seen);
    let handler = InlineChatHandler::diff_preview(
        move |request: StrategyRequest, _token: CancellationToken| {
            *sink.lock().unwrap() = Some(request);
            async { StrategyResponse::Cancel }
        },
    );
    let mut h = Harness::new(registry_with("look", handler));
    start(&mut h, "look");
    h.pump().await;

    let request = seen.lock().unwrap().clone().unwrap();
    assert_eq!(request.action_id, "look");
    assert_eq!(request.selection, TextRange::from_coords(2, 5, 2, 15));
    assert_eq!(request.cross_selection, TextRange::from_coords(2, 1, 2, MAX_COLUMN));
    assert_eq!(request.cross_text, "    let x = 1;");
    assert!(request.uri.is_some_and(|uri| uri.is_file()));
}

#[tokio::test]
async fn error_response_keeps_the_content_widget() {
    let handler = InlineChatHandler::diff_preview(
        |_request: StrategyRequest, _token: CancellationToken| async {
            StrategyResponse::error("model unavailable")
        },
    );
    let mut h = Harness::new(registry_with("rewrite", handler));
    start(&mut h, "rewrite");

    h.pump().await;

    assert_eq!(h.chat.status(), ChatStatus::Error);
    assert!(h.chat.widgets().session().is_some());
    let log = h.log.borrow();
    assert_eq!(log.diff_created, 0);
    assert_eq!(log.content_live, 1);
}

#[tokio::test]
async fn reply_without_an_answer_is_an_error() {
    let mut h = Harness::new(registry_with("rewrite", reply_with("  \n\t ")));
    start(&mut h, "rewrite");

    h.pump().await;

    assert_eq!(h.chat.status(), ChatStatus::Error);
    assert_eq!(h.log.borrow().diff_created, 0);
    assert!(h.chat.widgets().operation().is_none());
}

#[tokio::test]
async fn cancel_response_returns_to_ready() {
    let handler = InlineChatHandler::diff_preview(
        |_request: StrategyRequest, _token: CancellationToken| async { StrategyResponse::Cancel },
    );
    let mut h = Harness::new(registry_with("rewrite", handler));
    start(&mut h, "rewrite");

    h.pump().await;

    assert_eq!(h.chat.status(), ChatStatus::Ready);
    assert_eq!(h.log.borrow().diff_created, 0);
    assert_eq!(h.log.borrow().content_live, 1);
}

#[tokio::test]
async fn accept_writes_the_answer_once_then_tears_down() {
    let mut h = Harness::new(registry_with("rewrite", reply_with(REPLY)));
    start(&mut h, "rewrite");
    h.pump().await;
    let session = h.chat.widgets().session_id().unwrap();

    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Accept);
    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Accept);

    assert_eq!(h.editor.edits.len(), 1);
    assert_eq!(
        h.editor.text(),
        "fn main() {\nlet x = 2;\n    let y = 3;\n    println!(\"{x}\");\n}"
    );
    // Teardown is deferred to the next turn of the loop.
    assert_eq!(h.log.borrow().diff_live, 1);

    assert_eq!(h.pump().await, EngineEvent::IdleReset { session });

    let log = h.log.borrow();
    assert_eq!(log.diff_live, 0);
    assert_eq!(log.content_live, 0);
    assert!(!log.double_dispose);
    assert!(h.editor.hidden.is_empty());
    assert_eq!(h.chat.status(), ChatStatus::Ready);
}

#[tokio::test]
async fn accept_outside_done_does_nothing() {
    let mut h = Harness::new(registry_with("rewrite", until_cancelled()));
    start(&mut h, "rewrite");
    assert_eq!(h.chat.status(), ChatStatus::Thinking);

    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Accept);

    assert!(h.editor.edits.is_empty());
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn stale_idle_reset_spares_a_newer_session() {
    let mut h = Harness::new(registry_with("rewrite", reply_with(REPLY)));
    start(&mut h, "rewrite");
    h.pump().await;
    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Accept);

    h.editor.select(1, 1, 1, 12);
    let newer = h.chat.trigger(&mut h.editor);
    h.pump().await;

    assert!(newer.is_some());
    assert_eq!(h.chat.widgets().session_id(), newer);
    assert_eq!(h.log.borrow().content_live, 1);
}

#[tokio::test]
async fn regenerate_keeps_at_most_one_widget_of_each_kind() {
    let mut h = Harness::new(registry_with("rewrite", reply_with(REPLY)));
    start(&mut h, "rewrite");
    h.pump().await;

    for _ in 0..2 {
        h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Regenerate);
        assert_eq!(h.chat.status(), ChatStatus::Thinking);
        assert_eq!(h.log.borrow().diff_live, 0);
        assert!(h.editor.hidden.is_empty());
        h.pump().await;
        assert_eq!(h.chat.status(), ChatStatus::Done);
    }
    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Discard);

    let log = h.log.borrow();
    assert_eq!(log.diff_created, 3);
    assert_eq!(log.content_created, 1);
    assert_eq!(log.max_diff_live, 1);
    assert_eq!(log.max_content_live, 1);
    assert_eq!(log.diff_live, 0);
    assert_eq!(log.content_live, 0);
    assert!(!log.double_dispose);
    assert_eq!(h.chat.status(), ChatStatus::Ready);
}

#[tokio::test]
async fn regenerate_recovers_from_error() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let handler = InlineChatHandler::diff_preview(
        move |_request: StrategyRequest, _token: CancellationToken| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    StrategyResponse::error("rate limited")
                } else {
                    StrategyResponse::reply("let x = 3;")
                }
            }
        },
    );
    let mut h = Harness::new(registry_with("rewrite", handler));
    start(&mut h, "rewrite");
    h.pump().await;
    assert_eq!(h.chat.status(), ChatStatus::Error);

    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Regenerate);
    h.pump().await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(h.chat.status(), ChatStatus::Done);
    assert_eq!(h.log.borrow().diff_proposed.as_deref(), Some("let x = 3;"));
}

#[tokio::test]
async fn clicks_while_thinking_are_ignored() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handler = InlineChatHandler::diff_preview(
        move |_request: StrategyRequest, token: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                token.cancelled().await;
                StrategyResponse::Cancel
            }
        },
    );
    let mut h = Harness::new(registry_with("rewrite", handler));
    start(&mut h, "rewrite");

    h.chat
        .handle_widget_event(&mut h.editor, WidgetEvent::ActionClicked("rewrite".into()));
    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::Regenerate);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.chat.status(), ChatStatus::Thinking);
}

#[tokio::test]
async fn model_change_while_pending_drops_the_late_result() {
    let mut h = Harness::new(registry_with("rewrite", until_cancelled()));
    start(&mut h, "rewrite");
    let token = h.chat.widgets().token();

    h.chat
        .handle_editor_event(&mut h.editor, EditorEvent::ModelChanged, Instant::now());
    assert!(token.is_cancelled());

    let event = h.pump().await;

    assert!(matches!(event, EngineEvent::StrategyFinished { .. }));
    assert_eq!(h.chat.status(), ChatStatus::Ready);
    let log = h.log.borrow();
    assert_eq!(log.diff_created, 0);
    assert_eq!(log.content_live, 0);
    assert!(h.editor.hidden.is_empty());
}

#[tokio::test]
async fn late_result_does_not_touch_a_newer_session() {
    let mut h = Harness::new(registry_with("rewrite", until_cancelled()));
    start(&mut h, "rewrite");

    // Re-triggering cancels the first call and opens a fresh session.
    let newer = h.chat.trigger(&mut h.editor);
    h.pump().await;

    assert_eq!(h.chat.widgets().session_id(), newer);
    assert_eq!(h.chat.status(), ChatStatus::Ready);
    assert_eq!(h.log.borrow().diff_created, 0);
    assert_eq!(h.log.borrow().content_live, 1);
}

#[tokio::test]
async fn overflow_nudges_only_when_the_diff_ends_the_document() {
    let mut h = Harness::new(registry_with("rewrite", reply_with("}\n// end of main")));
    h.editor.select(4, 1, 4, 2);
    h.chat.trigger(&mut h.editor);
    h.chat
        .handle_widget_event(&mut h.editor, WidgetEvent::ActionClicked("rewrite".into()));
    h.pump().await;

    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::DiffOverflow(3));

    // line height 20 * 3 overflow lines + 12 padding
    assert_eq!(h.log.borrow().offset_top, Some(72));
}

#[tokio::test]
async fn overflow_above_the_last_line_is_left_alone() {
    let mut h = Harness::new(registry_with("rewrite", reply_with(REPLY)));
    start(&mut h, "rewrite");
    h.pump().await;

    h.chat.handle_widget_event(&mut h.editor, WidgetEvent::DiffOverflow(3));

    assert_eq!(h.log.borrow().offset_top, None);
}
