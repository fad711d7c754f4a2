//! Chat status state machine.
//!
//! ```text
//!            +-------------------- any ---------------------+
//!            v                                              |
//!         READY ---run---> THINKING ---reply---> DONE       |
//!                             |  \---error/unusable--> ERROR
//!                             +---cancel/stale---> READY
//!         DONE | ERROR ---regenerate---> THINKING
//! ```
//!
//! Every change is published on a `tokio::sync::watch` channel so hosts can
//! redraw status indicators without polling.

use tokio::sync::watch;

use crate::error::InlineChatError;
use crate::types::ChatStatus;

/// Returns `true` when `from -> to` is a listed transition.
pub fn is_valid_transition(from: ChatStatus, to: ChatStatus) -> bool {
    use ChatStatus::*;
    matches!(
        (from, to),
        (_, Ready)
            | (Ready, Thinking)
            | (Done, Thinking)
            | (Error, Thinking)
            | (Thinking, Error)
            | (Thinking, Done)
    )
}

/// Holds the current [`ChatStatus`] and publishes transitions.
#[derive(Debug)]
pub struct ChatStatusMachine {
    tx: watch::Sender<ChatStatus>,
}

impl ChatStatusMachine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ChatStatus::Ready);
        Self { tx }
    }

    pub fn current(&self) -> ChatStatus {
        *self.tx.borrow()
    }

    /// Subscribes to status changes. The receiver sees the current value
    /// immediately and is marked changed on every accepted transition.
    pub fn subscribe(&self) -> watch::Receiver<ChatStatus> {
        self.tx.subscribe()
    }

    /// Requests `from -> to`. Rejected requests leave the status untouched.
    pub fn transition(&self, to: ChatStatus) -> Result<(), InlineChatError> {
        let from = self.current();
        if !is_valid_transition(from, to) {
            tracing::warn!(%from, %to, "ignoring invalid chat status transition");
            return Err(InlineChatError::InvalidTransition { from, to });
        }
        tracing::debug!(%from, %to, "chat status");
        // send_replace keeps working with zero subscribers.
        self.tx.send_replace(to);
        Ok(())
    }

    /// Unconditional `* -> READY`.
    pub fn reset(&self) {
        if self.current() != ChatStatus::Ready {
            tracing::debug!(from = %self.current(), "chat status reset");
            self.tx.send_replace(ChatStatus::Ready);
        }
    }

    /// Whether a new trigger attempt may start (only from READY or ERROR).
    pub fn allows_trigger(&self) -> bool {
        matches!(self.current(), ChatStatus::Ready | ChatStatus::Error)
    }
}

impl Default for ChatStatusMachine {
    fn default() -> Self {
        Self::new()
    }
}
