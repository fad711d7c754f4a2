//! Decides when the chat affordance should be (re)opened.
//!
//! The watcher is a gatekeeper only. It tracks whether the last mouse release
//! expressed "show" intent, coalesces selection-change and mouse-up events with
//! a trailing-edge debounce, and on the debounced edge asks whether a trigger
//! attempt is allowed. The real precondition checks live in
//! [`WidgetLifecycleManager::open_content_widget`](crate::widgets::WidgetLifecycleManager::open_content_widget).

use std::time::Duration;

use tokio::time::Instant;

use crate::debounce::Debouncer;
use crate::editor::EditorEvent;
use crate::types::ChatStatus;

/// Which event channel fed the debouncer last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    SelectionChanged,
    MouseUp,
}

/// What the contribution must do right away in response to an editor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherReaction {
    Nothing,
    /// Tear everything down unconditionally.
    ResetAll,
    /// Force-close any floating context menu.
    HideContextMenu,
}

#[derive(Debug)]
pub struct TriggerWatcher {
    show_intent: bool,
    debouncer: Debouncer<TriggerSource>,
}

impl TriggerWatcher {
    pub fn new(window: Duration) -> Self {
        Self { show_intent: false, debouncer: Debouncer::new(window) }
    }

    pub fn observe(&mut self, event: EditorEvent, now: Instant) -> WatcherReaction {
        match event {
            EditorEvent::ModelChanged => {
                self.debouncer.clear();
                WatcherReaction::ResetAll
            }
            EditorEvent::ScrollChanged => WatcherReaction::HideContextMenu,
            EditorEvent::MouseDown => {
                self.show_intent = false;
                WatcherReaction::Nothing
            }
            EditorEvent::MouseUp { on_chat_widget } => {
                self.show_intent = !on_chat_widget;
                self.debouncer.push(TriggerSource::MouseUp, now);
                WatcherReaction::Nothing
            }
            EditorEvent::SelectionChanged => {
                self.debouncer.push(TriggerSource::SelectionChanged, now);
                WatcherReaction::Nothing
            }
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Consumes the debounced edge if it is due and decides whether to attempt
    /// a trigger.
    ///
    /// Returns `false` when nothing is due, when auto-show is off, when the last
    /// mouse release carried no show intent, or while a request is in flight or
    /// a fresh diff is on screen.
    pub fn poll(&mut self, now: Instant, auto_show: bool, status: ChatStatus) -> bool {
        let Some(source) = self.debouncer.poll(now) else {
            return false;
        };
        let allowed = auto_show
            && self.show_intent
            && matches!(status, ChatStatus::Ready | ChatStatus::Error);
        tracing::trace!(?source, auto_show, show_intent = self.show_intent, %status, allowed, "trigger edge");
        allowed
    }

    pub fn show_intent(&self) -> bool {
        self.show_intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    #[test]
    fn mouse_up_on_widget_clears_intent() {
        let now = Instant::now();
        let mut watcher = TriggerWatcher::new(WINDOW);
        watcher.observe(EditorEvent::MouseUp { on_chat_widget: true }, now);
        assert!(!watcher.poll(now + WINDOW, true, ChatStatus::Ready));
    }

    #[test]
    fn fires_once_after_burst() {
        let now = Instant::now();
        let mut watcher = TriggerWatcher::new(WINDOW);
        watcher.observe(EditorEvent::MouseDown, now);
        watcher.observe(EditorEvent::SelectionChanged, now);
        watcher.observe(EditorEvent::MouseUp { on_chat_widget: false }, now + Duration::from_millis(30));
        assert!(!watcher.poll(now + Duration::from_millis(100), true, ChatStatus::Ready));
        assert!(watcher.poll(now + Duration::from_millis(130), true, ChatStatus::Ready));
        assert!(!watcher.poll(now + Duration::from_millis(400), true, ChatStatus::Ready));
    }

    #[test]
    fn gate_respects_preference_and_status() {
        let now = Instant::now();
        let mut watcher = TriggerWatcher::new(WINDOW);
        for (auto_show, status, expected) in [
            (false, ChatStatus::Ready, false),
            (true, ChatStatus::Thinking, false),
            (true, ChatStatus::Done, false),
            (true, ChatStatus::Error, true),
            (true, ChatStatus::Ready, true),
        ] {
            watcher.observe(EditorEvent::MouseUp { on_chat_widget: false }, now);
            assert_eq!(watcher.poll(now + WINDOW, auto_show, status), expected, "{status}");
        }
    }

    #[test]
    fn model_change_drops_pending_edge() {
        let now = Instant::now();
        let mut watcher = TriggerWatcher::new(WINDOW);
        watcher.observe(EditorEvent::MouseUp { on_chat_widget: false }, now);
        assert_eq!(watcher.observe(EditorEvent::ModelChanged, now), WatcherReaction::ResetAll);
        assert_eq!(watcher.deadline(), None);
    }
}
