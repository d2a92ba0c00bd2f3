//! Callback types carried by virtual nodes.
//!
//! Callbacks are `Rc<dyn Fn>` so a node can be cloned into the mounted tree
//! while the caller keeps its own handle. Identity of a callback is the
//! identity of its `Rc`, which is how the reconciler decides whether a ref
//! changed between two renders.

use std::fmt;
use std::rc::Rc;

use crate::error::{HookError, HookResult};
use crate::types::{NodeId, Props};

// =============================================================================
// Ref callback
// =============================================================================

/// Callback notified with the live node on attach and `None` on detach.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(Option<NodeId>) -> HookResult>);

impl RefCallback {
    pub fn new(callback: impl Fn(Option<NodeId>) -> HookResult + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, node: Option<NodeId>) -> HookResult {
        (self.0)(node)
    }

    /// Same underlying callback.
    pub fn ptr_eq(&self, other: &RefCallback) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefCallback({:p})", Rc::as_ptr(&self.0))
    }
}

// =============================================================================
// Stateless lifecycle hooks
// =============================================================================

/// `onComponentWillMount(props)`.
pub type WillMountHook = Rc<dyn Fn(&Props) -> HookResult>;

/// `onComponentDidMount(node)` / `onComponentWillUnmount(node)`.
pub type NodeHook = Rc<dyn Fn(NodeId) -> HookResult>;

/// `onComponentShouldUpdate(prev, next) -> bool`.
pub type ShouldUpdateHook = Rc<dyn Fn(&Props, &Props) -> Result<bool, HookError>>;

/// `onComponentWillUpdate(prev, next)` / `onComponentDidUpdate(prev, next)`.
pub type UpdateHook = Rc<dyn Fn(&Props, &Props) -> HookResult>;

/// Lifecycle hook props for a function component.
///
/// These are the reserved `onComponent*` props. They live beside the plain
/// prop map so they keep their types, and they are read from the node that is
/// current when the hook fires.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub on_component_will_mount: Option<WillMountHook>,
    pub on_component_did_mount: Option<NodeHook>,
    pub on_component_will_unmount: Option<NodeHook>,
    pub on_component_should_update: Option<ShouldUpdateHook>,
    pub on_component_will_update: Option<UpdateHook>,
    pub on_component_did_update: Option<UpdateHook>,
}

impl LifecycleHooks {
    pub fn is_empty(&self) -> bool {
        self.on_component_will_mount.is_none()
            && self.on_component_did_mount.is_none()
            && self.on_component_will_unmount.is_none()
            && self.on_component_should_update.is_none()
            && self.on_component_will_update.is_none()
            && self.on_component_did_update.is_none()
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("will_mount", &self.on_component_will_mount.is_some())
            .field("did_mount", &self.on_component_did_mount.is_some())
            .field("will_unmount", &self.on_component_will_unmount.is_some())
            .field("should_update", &self.on_component_should_update.is_some())
            .field("will_update", &self.on_component_will_update.is_some())
            .field("did_update", &self.on_component_did_update.is_some())
            .finish()
    }
}
