//! Stateful components.
//!
//! A stateful component is a value implementing [`Component`], produced by a
//! [`ComponentClass`] each time a node of that class is mounted. The instance
//! lives until the node leaves its slot.
//!
//! ```ignore
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn initial_state(&self, _props: &Props) -> State {
//!         object_to_map(json!({ "count": 0 }))
//!     }
//!
//!     fn render(&self, scope: &Scope<'_>) -> Option<VNode> {
//!         let count = scope.state_value("count").cloned().unwrap_or_default();
//!         Some(VNode::element("span").child(VNode::text(count.to_string())))
//!     }
//! }
//!
//! let counter = ComponentClass::new("Counter", |_| Counter);
//! renderer.render(Some(VNode::component(&counter)), root)?;
//! ```

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::context::Context;
use crate::error::{HookError, HookResult, ReconcileError};
use crate::pipeline::Updater;
use crate::types::{merge_map, object_to_map, ChildContext, NodeId, Props, State};
use crate::vnode::VNode;

// =============================================================================
// Component trait
// =============================================================================

/// User render logic of a stateful component.
///
/// Only [`render`](Component::render) is required. Every hook receives a
/// [`Scope`] giving access to the instance's props, state and context.
#[allow(unused_variables)]
pub trait Component: 'static {
    /// State before the first render.
    fn initial_state(&self, props: &Props) -> State {
        State::new()
    }

    /// Describe the subtree. `None` renders an empty slot.
    fn render(&self, scope: &Scope<'_>) -> Option<VNode>;

    /// Values published to descendants. Computed before every render.
    fn get_child_context(&self, scope: &Scope<'_>) -> ChildContext {
        ChildContext::new()
    }

    /// Before the first render. `set_state` merges immediately.
    fn component_will_mount(&mut self, scope: &mut Scope<'_>) -> HookResult {
        Ok(())
    }

    /// After the subtree is in the target. `scope.node()` is the root node.
    fn component_did_mount(&mut self, scope: &mut Scope<'_>) -> HookResult {
        Ok(())
    }

    /// A parent render is delivering new props. `set_state` merges into the
    /// state the upcoming render will see.
    fn component_will_receive_props(
        &mut self,
        scope: &mut Scope<'_>,
        next_props: &Props,
    ) -> HookResult {
        Ok(())
    }

    fn should_component_update(
        &mut self,
        scope: &mut Scope<'_>,
        next_props: &Props,
        next_state: &State,
    ) -> Result<bool, HookError> {
        Ok(true)
    }

    fn component_will_update(
        &mut self,
        scope: &mut Scope<'_>,
        next_props: &Props,
        next_state: &State,
    ) -> HookResult {
        Ok(())
    }

    fn component_did_update(
        &mut self,
        scope: &mut Scope<'_>,
        prev_props: &Props,
        prev_state: &State,
    ) -> HookResult {
        Ok(())
    }

    /// Before any node of the subtree is removed.
    fn component_will_unmount(&mut self, scope: &mut Scope<'_>) -> HookResult {
        Ok(())
    }
}

// =============================================================================
// Component class
// =============================================================================

struct ClassInner {
    name: &'static str,
    construct: Box<dyn Fn(&Props) -> Box<dyn Component>>,
}

/// Shared handle identifying a component type.
///
/// Two nodes are of the same component type only when they were built from
/// clones of the same `ComponentClass`. The name is for logs and errors.
#[derive(Clone)]
pub struct ComponentClass {
    inner: Rc<ClassInner>,
}

impl ComponentClass {
    pub fn new<C, F>(name: &'static str, construct: F) -> Self
    where
        C: Component,
        F: Fn(&Props) -> C + 'static,
    {
        Self {
            inner: Rc::new(ClassInner {
                name,
                construct: Box::new(move |props| Box::new(construct(props))),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn ptr_eq(&self, other: &ComponentClass) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn construct(&self, props: &Props) -> Box<dyn Component> {
        (self.inner.construct)(props)
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentClass").field(&self.inner.name).finish()
    }
}

// =============================================================================
// Scope
// =============================================================================

/// What a component sees while one of its hooks runs.
pub struct Scope<'a> {
    props: &'a Props,
    state: &'a mut State,
    context: &'a Context,
    children: &'a [VNode],
    node: Option<NodeId>,
    updater: &'a Updater,
    merge_immediately: bool,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        props: &'a Props,
        state: &'a mut State,
        context: &'a Context,
        children: &'a [VNode],
        updater: &'a Updater,
    ) -> Self {
        Self {
            props,
            state,
            context,
            children,
            node: None,
            updater,
            merge_immediately: false,
        }
    }

    pub(crate) fn at_node(mut self, node: Option<NodeId>) -> Self {
        self.node = node;
        self
    }

    /// State patches merge into `state` directly instead of scheduling.
    pub(crate) fn merging(mut self) -> Self {
        self.merge_immediately = true;
        self
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn state(&self) -> &State {
        self.state
    }

    pub fn state_value(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Context published by ancestors.
    pub fn context(&self) -> &Context {
        self.context
    }

    /// Children passed by the parent.
    pub fn children(&self) -> &[VNode] {
        self.children
    }

    /// Root target node of the rendered subtree, once it exists.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Handle for requesting updates outside of hooks.
    pub fn updater(&self) -> Updater {
        self.updater.clone()
    }

    /// Shallow-merge `patch` into the state.
    ///
    /// While mounting or receiving props the merge is immediate and no extra
    /// render is scheduled. Otherwise the patch joins the pending queue.
    pub fn set_state(&mut self, patch: Value) {
        if self.merge_immediately {
            merge_map(self.state, object_to_map(patch));
        } else {
            self.updater.set_state(patch);
        }
    }

    /// Like [`set_state`](Self::set_state), but outside of mounting the update
    /// runs as its own pass. From inside a hook that pass is queued behind the
    /// current one.
    pub fn set_state_sync(&mut self, patch: Value) -> Result<(), ReconcileError> {
        if self.merge_immediately {
            merge_map(self.state, object_to_map(patch));
            Ok(())
        } else {
            self.updater.set_state_sync(patch)
        }
    }
}
