//! inlay-core - inline chat and diff preview orchestration for code editors.
//!
//! A user selects code, picks an action, and a pluggable strategy proposes a
//! replacement that is shown as an inline diff to accept, regenerate or
//! discard. This crate is the engine behind that interaction; it has no UI of
//! its own. Hosts implement the collaborator traits in [`editor`] and
//! [`widgets`] and drive one [`InlineChatContribution`] per editor from their
//! event loop.
//!
//! Module map, leaves first:
//!
//! - [`types`], [`text`] - positions, ranges, status values, pure text helpers
//! - [`status`] - the READY/THINKING/DONE/ERROR state machine
//! - [`debounce`], [`watcher`] - when to try opening the affordance
//! - [`widgets`] - widget contracts and the lifecycle manager
//! - [`orchestrator`] - strategy runs, outcome handling, accept/regenerate
//! - [`contribution`] - the per-editor entry point

pub mod contribution;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod status;
pub mod text;
pub mod types;
pub mod watcher;
pub mod widgets;

pub use contribution::{InlineChatContribution, InlineChatOptions, InlineChatServices, WidgetEvent};
pub use editor::{Capabilities, ContextMenu, EditorEvent, EditorSurface, PreferenceSource};
pub use error::InlineChatError;
pub use orchestrator::EngineEvent;
pub use registry::{
    DiffPreviewStrategy, FeatureRegistry, InlineChatAction, InlineChatHandler, StrategyRequest,
};
pub use types::{
    ChatStatus, DocumentUri, InvocationTicket, SessionId, StrategyResponse, TextPosition,
    TextRange, MAX_COLUMN,
};
pub use widgets::{ContentWidget, DiffWidget, Disposable, WidgetFactory};

/// Re-exported so hosts and strategies name the same token type.
pub use tokio_util::sync::CancellationToken;
