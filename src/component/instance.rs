//! Stateful component instances.
//!
//! An instance wraps the user's [`Component`] with everything the reconciler
//! tracks for it: the node it was last rendered from, its state, the context
//! it was rendered under, its lifecycle phase and its rendered subtree.
//!
//! Hooks are invoked through the methods here so each one gets a correctly
//! built [`Scope`] and its failure is tagged with the hook that raised it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::class::{Component, ComponentClass, Scope};
use crate::context::Context;
use crate::engine::Mounted;
use crate::error::{HookError, HookKind, ReconcileError};
use crate::pipeline::{Driver, Updater};
use crate::types::{ChildContext, NodeId, Props, State};
use crate::vnode::VNode;

pub(crate) type InstanceRef = Rc<RefCell<Instance>>;

// =============================================================================
// Identity
// =============================================================================

/// Unique id of a component instance. Never reused within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

thread_local! {
    /// Counter for generating instance ids.
    static NEXT_INSTANCE_ID: Cell<u64> = const { Cell::new(0) };
}

impl InstanceId {
    fn next() -> Self {
        NEXT_INSTANCE_ID.with(|counter| {
            let id = counter.get();
            counter.set(id + 1);
            InstanceId(id)
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(raw: u64) -> Self {
        InstanceId(raw)
    }
}

// =============================================================================
// Phase
// =============================================================================

/// Lifecycle phase of an instance.
///
/// ```text
/// Unmounted -> Mounting -> Mounted <-> Updating
///                             |
///                             v
///                        Unmounting -> Unmounted (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Unmounted,
    Mounting,
    Mounted,
    Updating,
    Unmounting,
}

impl Phase {
    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Unmounted, Phase::Mounting)
                | (Phase::Mounting, Phase::Mounted)
                | (Phase::Mounted, Phase::Updating)
                | (Phase::Updating, Phase::Mounted)
                | (Phase::Mounted, Phase::Unmounting)
                | (Phase::Unmounting, Phase::Unmounted)
        )
    }

    /// Updates may be applied.
    pub fn is_live(self) -> bool {
        matches!(self, Phase::Mounting | Phase::Mounted | Phase::Updating)
    }
}

// =============================================================================
// Instance
// =============================================================================

pub(crate) struct Instance {
    id: InstanceId,
    class: ComponentClass,
    component: Box<dyn Component>,
    phase: Rc<Cell<Phase>>,
    updater: Updater,
    /// Node this instance was last rendered from.
    pub(crate) vnode: VNode,
    pub(crate) state: State,
    /// Ambient context from the parent, reused for self-initiated updates.
    pub(crate) context: Context,
    /// Target node the rendered root is inserted into.
    pub(crate) parent: NodeId,
    pub(crate) rendered: Option<Mounted>,
    /// Set once the instance has left the tree; it is never mounted again.
    retired: bool,
}

impl Instance {
    /// Construct the component and its initial state.
    pub(crate) fn create(
        class: &ComponentClass,
        vnode: &VNode,
        context: Context,
        parent: NodeId,
        driver: Weak<dyn Driver>,
    ) -> InstanceRef {
        let id = InstanceId::next();
        let component = class.construct(vnode.get_props());
        let state = component.initial_state(vnode.get_props());
        let phase = Rc::new(Cell::new(Phase::Unmounted));

        Rc::new_cyclic(|weak| {
            RefCell::new(Instance {
                id,
                class: class.clone(),
                component,
                phase: phase.clone(),
                updater: Updater::new(id, class.name(), weak.clone(), phase, driver),
                vnode: vnode.clone(),
                state,
                context,
                parent,
                rendered: None,
                retired: false,
            })
        })
    }

    pub(crate) fn id(&self) -> InstanceId {
        self.id
    }

    pub(crate) fn name(&self) -> &'static str {
        self.class.name()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub(crate) fn set_phase(&mut self, next: Phase) {
        let current = self.phase.get();
        debug_assert!(
            current.can_advance_to(next) && !(self.retired && next == Phase::Mounting),
            "invalid phase change {current:?} -> {next:?} for `{}`",
            self.name()
        );
        if next == Phase::Unmounted {
            self.retired = true;
        }
        tracing::trace!(component = self.name(), id = self.id.0, from = ?current, to = ?next, "phase");
        self.phase.set(next);
    }

    /// Root target node of the rendered subtree.
    pub(crate) fn root_node(&self) -> Option<NodeId> {
        self.rendered.as_ref().and_then(Mounted::node)
    }

    fn with_scope<R>(
        &mut self,
        merge: bool,
        f: impl FnOnce(&mut dyn Component, &mut Scope<'_>) -> R,
    ) -> R {
        let node = self.root_node();
        let Instance {
            component,
            vnode,
            state,
            context,
            updater,
            ..
        } = self;
        let mut scope = Scope::new(
            vnode.get_props(),
            state,
            context,
            vnode.get_children(),
            updater,
        )
        .at_node(node);
        if merge {
            scope = scope.merging();
        }
        f(component.as_mut(), &mut scope)
    }

    // -------------------------------------------------------------------------
    // Render
    // -------------------------------------------------------------------------

    pub(crate) fn child_context(&mut self) -> ChildContext {
        self.with_scope(false, |component, scope| component.get_child_context(scope))
    }

    /// Render with the current props and state. `None` becomes an empty slot.
    pub(crate) fn render(&mut self) -> VNode {
        self.with_scope(false, |component, scope| component.render(scope))
            .unwrap_or_else(VNode::null)
    }

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    pub(crate) fn will_mount(&mut self) -> Result<(), ReconcileError> {
        let tag = tag_hook(HookKind::WillMount, self.name());
        self.with_scope(true, |component, scope| component.component_will_mount(scope))
            .map_err(tag)
    }

    pub(crate) fn did_mount(&mut self) -> Result<(), ReconcileError> {
        let tag = tag_hook(HookKind::DidMount, self.name());
        self.with_scope(false, |component, scope| component.component_did_mount(scope))
            .map_err(tag)
    }

    /// `set_state` inside the hook lands in `next_state`.
    pub(crate) fn will_receive_props(
        &mut self,
        next_props: &Props,
        next_state: &mut State,
    ) -> Result<(), ReconcileError> {
        let tag = tag_hook(HookKind::WillReceiveProps, self.name());
        let node = self.root_node();
        let Instance {
            component,
            vnode,
            context,
            updater,
            ..
        } = self;
        let mut scope = Scope::new(
            vnode.get_props(),
            next_state,
            context,
            vnode.get_children(),
            updater,
        )
        .at_node(node)
        .merging();
        component
            .component_will_receive_props(&mut scope, next_props)
            .map_err(tag)
    }

    pub(crate) fn should_update(
        &mut self,
        next_props: &Props,
        next_state: &State,
    ) -> Result<bool, ReconcileError> {
        let tag = tag_hook(HookKind::ShouldUpdate, self.name());
        self.with_scope(false, |component, scope| {
            component.should_component_update(scope, next_props, next_state)
        })
        .map_err(tag)
    }

    pub(crate) fn will_update(
        &mut self,
        next_props: &Props,
        next_state: &State,
    ) -> Result<(), ReconcileError> {
        let tag = tag_hook(HookKind::WillUpdate, self.name());
        self.with_scope(false, |component, scope| {
            component.component_will_update(scope, next_props, next_state)
        })
        .map_err(tag)
    }

    pub(crate) fn did_update(
        &mut self,
        prev_props: &Props,
        prev_state: &State,
    ) -> Result<(), ReconcileError> {
        let tag = tag_hook(HookKind::DidUpdate, self.name());
        self.with_scope(false, |component, scope| {
            component.component_did_update(scope, prev_props, prev_state)
        })
        .map_err(tag)
    }

    pub(crate) fn will_unmount(&mut self) -> Result<(), ReconcileError> {
        let tag = tag_hook(HookKind::WillUnmount, self.name());
        self.with_scope(false, |component, scope| component.component_will_unmount(scope))
            .map_err(tag)
    }
}

fn tag_hook(hook: HookKind, component: &'static str) -> impl FnOnce(HookError) -> ReconcileError {
    move |source| ReconcileError::hook(hook, component, source)
}
