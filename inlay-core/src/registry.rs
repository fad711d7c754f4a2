//! Inline chat actions and the handlers bound to them.
//!
//! The content widget lists actions by id. When one is clicked the contribution
//! looks its handler bundle up exactly once and runs whichever operations the
//! bundle provides.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::editor::EditorSurface;
use crate::types::{DocumentUri, StrategyResponse, TextRange};

/// Owned snapshot of the editor handed to a strategy.
///
/// Strategies run on a spawned task, so they get copies of what they need
/// rather than a borrow of the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyRequest {
    pub action_id: String,
    pub uri: Option<DocumentUri>,
    /// The range the user originally selected.
    pub selection: TextRange,
    /// `selection` expanded to whole lines; the replacement unit.
    pub cross_selection: TextRange,
    /// Text under `cross_selection`.
    pub cross_text: String,
}

/// Produces a proposed replacement for a selection.
///
/// Implementations should watch `token` and resolve to
/// [`StrategyResponse::Cancel`] once it fires. The engine never acts on a
/// result whose session has gone away, whatever the strategy returns.
pub trait DiffPreviewStrategy: Send + Sync {
    fn provide(
        &self,
        request: StrategyRequest,
        token: CancellationToken,
    ) -> BoxFuture<'static, StrategyResponse>;
}

impl<F, Fut> DiffPreviewStrategy for F
where
    F: Fn(StrategyRequest, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = StrategyResponse> + Send + 'static,
{
    fn provide(
        &self,
        request: StrategyRequest,
        token: CancellationToken,
    ) -> BoxFuture<'static, StrategyResponse> {
        self(request, token).boxed()
    }
}

/// Synchronous action run directly against the editor.
pub type ExecuteFn = Arc<dyn Fn(&mut dyn EditorSurface) + Send + Sync>;

/// An entry shown in the content widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineChatAction {
    pub id: String,
    pub label: String,
}

impl InlineChatAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}

/// Operations bound to an action. Either may be absent.
#[derive(Clone, Default)]
pub struct InlineChatHandler {
    pub execute: Option<ExecuteFn>,
    pub diff_preview: Option<Arc<dyn DiffPreviewStrategy>>,
}

impl InlineChatHandler {
    pub fn execute(f: impl Fn(&mut dyn EditorSurface) + Send + Sync + 'static) -> Self {
        Self { execute: Some(Arc::new(f)), diff_preview: None }
    }

    pub fn diff_preview(strategy: impl DiffPreviewStrategy + 'static) -> Self {
        Self { execute: None, diff_preview: Some(Arc::new(strategy)) }
    }
}

impl fmt::Debug for InlineChatHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineChatHandler")
            .field("execute", &self.execute.is_some())
            .field("diff_preview", &self.diff_preview.is_some())
            .finish()
    }
}

/// Ordered map from action id to action and handler.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    order: Vec<InlineChatAction>,
    handlers: HashMap<String, InlineChatHandler>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action`. Re-registering an id replaces the entry in place.
    pub fn register(&mut self, action: InlineChatAction, handler: InlineChatHandler) {
        match self.order.iter_mut().find(|a| a.id == action.id) {
            Some(existing) => *existing = action.clone(),
            None => self.order.push(action.clone()),
        }
        self.handlers.insert(action.id, handler);
    }

    pub fn action(&self, id: &str) -> Option<&InlineChatAction> {
        self.order.iter().find(|a| a.id == id)
    }

    pub fn handler(&self, id: &str) -> Option<&InlineChatHandler> {
        self.handlers.get(id)
    }

    /// Actions in registration order.
    pub fn actions(&self) -> &[InlineChatAction] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
