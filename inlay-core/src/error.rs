//! Engine error type.
//!
//! None of these ever reach the editor host as a failure: the contribution
//! logs them and carries on. They exist so internal calls can use `?` and so
//! tests can assert on the exact rejection.

use thiserror::Error;

use crate::types::ChatStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InlineChatError {
    /// A status change that the chat state machine does not allow, usually a
    /// late callback from a superseded attempt.
    #[error("invalid chat status transition {from} -> {to}")]
    InvalidTransition { from: ChatStatus, to: ChatStatus },

    /// The host dropped the receiving end of the engine event channel.
    #[error("engine event channel is closed")]
    ChannelClosed,
}
