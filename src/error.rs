//! Error types.
//!
//! User hooks fail with [`HookError`]. The reconciler wraps those into
//! [`ReconcileError`], naming the hook and the component it came from, and
//! aborts the pass that was running.

use std::fmt;

use thiserror::Error;

use crate::types::NodeId;

/// Error returned by a user lifecycle hook or ref callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result type of every lifecycle hook.
pub type HookResult = Result<(), HookError>;

/// Which lifecycle hook produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    WillMount,
    DidMount,
    WillReceiveProps,
    ShouldUpdate,
    WillUpdate,
    DidUpdate,
    WillUnmount,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::WillMount => "componentWillMount",
            HookKind::DidMount => "componentDidMount",
            HookKind::WillReceiveProps => "componentWillReceiveProps",
            HookKind::ShouldUpdate => "shouldComponentUpdate",
            HookKind::WillUpdate => "componentWillUpdate",
            HookKind::DidUpdate => "componentDidUpdate",
            HookKind::WillUnmount => "componentWillUnmount",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by [`Renderer`](crate::Renderer) and
/// [`Updater`](crate::Updater) operations.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A lifecycle hook failed and aborted the pass.
    #[error("{hook} of `{component}` failed: {source}")]
    Hook {
        hook: HookKind,
        component: &'static str,
        #[source]
        source: HookError,
    },

    /// A batched update failed while the pending queue was flushed.
    #[error("batched update of `{component}` failed")]
    Flush {
        component: &'static str,
        #[source]
        source: Box<ReconcileError>,
    },

    /// Batched updates kept scheduling more updates without settling.
    #[error("batched updates did not settle after {rounds} flush rounds")]
    UpdateLoop { rounds: usize },

    /// The renderer that owned a component instance no longer exists.
    #[error("the renderer owning this component was dropped")]
    RendererDropped,
}

impl ReconcileError {
    pub(crate) fn hook(hook: HookKind, component: &'static str, source: HookError) -> Self {
        ReconcileError::Hook {
            hook,
            component,
            source,
        }
    }

    /// The hook that failed, looking through flush wrappers.
    pub fn hook_kind(&self) -> Option<HookKind> {
        match self {
            ReconcileError::Hook { hook, .. } => Some(*hook),
            ReconcileError::Flush { source, .. } => source.hook_kind(),
            ReconcileError::UpdateLoop { .. } | ReconcileError::RendererDropped => None,
        }
    }
}

/// A ref callback that failed. Reported, never fatal to the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefError {
    /// The node the callback was given (`None` for a detach).
    pub node: Option<NodeId>,
    pub error: HookError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_error_display() {
        let err = ReconcileError::hook(HookKind::WillMount, "Counter", HookError::from("boom"));
        assert_eq!(err.to_string(), "componentWillMount of `Counter` failed: boom");
        assert_eq!(err.hook_kind(), Some(HookKind::WillMount));
    }

    #[test]
    fn test_flush_error_keeps_hook_kind() {
        let inner = ReconcileError::hook(HookKind::DidUpdate, "List", "bad".into());
        let err = ReconcileError::Flush {
            component: "List",
            source: Box::new(inner),
        };
        assert_eq!(err.hook_kind(), Some(HookKind::DidUpdate));
        assert!(std::error::Error::source(&err).is_some());
    }
}
