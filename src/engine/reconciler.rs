//! The reconciler.
//!
//! Diffs a mounted tree against the next vnode tree and drives the target
//! through [`TargetTree`]. One `Reconciler` lives for one pass: it borrows the
//! target and the pass's [`EffectQueue`], and is dropped before the effects
//! are flushed.
//!
//! Per slot:
//!
//! ```text
//! old      next     action
//! ------   ------   -------------------------------------------------
//! none     vnode    create (detached), then insert
//! mounted  none     release (willUnmount, ref detaches), then remove
//! mounted  vnode    same slot: patch in place
//!                   otherwise: release old, create new, insert before
//!                   the old node, remove the old node
//! ```
//!
//! Subtrees are always built detached and inserted with a single `insert`.
//! Context is a plain value: each component call receives the scope its
//! ancestors produced and hands a pushed copy to its own children.

use std::rc::Weak;

use serde_json::Value;
use tracing::trace;

use super::effects::{Effect, EffectQueue};
use super::keyed;
use super::mounted::Mounted;
use crate::component::{ComponentClass, FunctionComponent, Instance, InstanceRef, Phase};
use crate::context::Context;
use crate::error::{HookKind, ReconcileError};
use crate::pipeline::{Driver, RendererOptions};
use crate::target::TargetTree;
use crate::types::{merge_map, NodeId, Props, State};
use crate::vnode::{RefCallback, Tag, VNode, VNodeKind};

pub(crate) struct Reconciler<'a, T: TargetTree> {
    pub(super) target: &'a mut T,
    effects: &'a mut EffectQueue,
    driver: Weak<dyn Driver>,
    options: &'a RendererOptions,
}

impl<'a, T: TargetTree> Reconciler<'a, T> {
    pub(crate) fn new(
        target: &'a mut T,
        effects: &'a mut EffectQueue,
        driver: Weak<dyn Driver>,
        options: &'a RendererOptions,
    ) -> Self {
        Self {
            target,
            effects,
            driver,
            options,
        }
    }

    // =========================================================================
    // Root
    // =========================================================================

    /// Reconcile the tree of one container.
    ///
    /// Returns the tree to keep for the container alongside the outcome. On a
    /// failed patch the partially patched tree is still returned so it stays
    /// in step with the target.
    pub(crate) fn render_root(
        &mut self,
        old: Option<Mounted>,
        next: Option<&VNode>,
        container: NodeId,
    ) -> (Option<Mounted>, Result<(), ReconcileError>) {
        let root_context = Context::new();
        match (old, next) {
            (None, None) => (None, Ok(())),
            (None, Some(next)) => match self.create(next, container, &root_context) {
                Ok(mounted) => {
                    if let Some(node) = mounted.node() {
                        self.target.insert(container, node, None);
                    }
                    (Some(mounted), Ok(()))
                }
                Err(err) => (None, Err(err)),
            },
            (Some(old), None) => (None, self.unmount(old)),
            (Some(mut old), Some(next)) => {
                let result = self.patch(&mut old, next, container, &root_context);
                (Some(old), result)
            }
        }
    }

    // =========================================================================
    // Mount
    // =========================================================================

    /// Build the subtree for `vnode`, detached.
    ///
    /// `parent` is the target node the subtree root will be inserted into.
    /// Component instances remember it for their own updates.
    pub(crate) fn create(
        &mut self,
        vnode: &VNode,
        parent: NodeId,
        context: &Context,
    ) -> Result<Mounted, ReconcileError> {
        // A subtree that fails halfway is dropped along with what it queued.
        let mark = self.effects.len();
        let result = match vnode.tag() {
            Tag::Class(class) => self.create_class(vnode, class, parent, context),
            Tag::Function(function) => self.create_function(vnode, function, parent, context),
            Tag::Element(_) | Tag::None => self.create_host(vnode, context),
        };
        if result.is_err() {
            self.effects.truncate(mark);
        }
        result
    }

    fn create_host(&mut self, vnode: &VNode, context: &Context) -> Result<Mounted, ReconcileError> {
        let node = self.target.create_node(vnode);
        let mounted = match vnode.kind() {
            VNodeKind::Text => Mounted::Text {
                vnode: vnode.clone(),
                node,
            },
            VNodeKind::Element => {
                for (key, value) in vnode.get_props() {
                    self.target.set_property(node, key, value);
                }
                let mut children = Vec::with_capacity(vnode.get_children().len());
                for child in vnode.get_children() {
                    let mounted = self.create(child, node, context)?;
                    if let Some(child_node) = mounted.node() {
                        self.target.insert(node, child_node, None);
                    }
                    children.push(mounted);
                }
                Mounted::Element {
                    vnode: vnode.clone(),
                    node,
                    children,
                }
            }
            VNodeKind::Null | VNodeKind::Component => {
                return Ok(Mounted::Void {
                    vnode: vnode.clone(),
                    node,
                });
            }
        };
        trace!(%node, tag = vnode.tag().name(), "created");
        if let Some(callback) = vnode.ref_callback() {
            self.effects.attach(callback, node);
        }
        Ok(mounted)
    }

    fn create_class(
        &mut self,
        vnode: &VNode,
        class: &ComponentClass,
        parent: NodeId,
        context: &Context,
    ) -> Result<Mounted, ReconcileError> {
        trace!(component = class.name(), "mount class");
        let instance = Instance::create(class, vnode, context.clone(), parent, self.driver.clone());
        {
            let mut inst = instance.borrow_mut();
            inst.set_phase(Phase::Mounting);
            inst.will_mount()?;

            // Child context sees whatever willMount merged into the state.
            let child_context = inst.child_context();
            let scope = inst.context.push(child_context);
            let rendered = inst.render();
            let mounted = self.create(&rendered, parent, &scope)?;
            inst.rendered = Some(mounted);
            inst.set_phase(Phase::Mounted);
        }

        self.effects.push(Effect::DidMount {
            instance: instance.clone(),
        });
        let mounted = Mounted::Class {
            vnode: vnode.clone(),
            instance,
        };
        if let (Some(callback), Some(node)) = (vnode.ref_callback(), mounted.node()) {
            self.effects.attach(callback, node);
        }
        Ok(mounted)
    }

    fn create_function(
        &mut self,
        vnode: &VNode,
        function: &FunctionComponent,
        parent: NodeId,
        context: &Context,
    ) -> Result<Mounted, ReconcileError> {
        let name = function.name();
        trace!(component = name, "mount function");
        let hooks = vnode.hooks();
        if let Some(hook) = &hooks.on_component_will_mount {
            hook(vnode.get_props())
                .map_err(|source| ReconcileError::hook(HookKind::WillMount, name, source))?;
        }

        let rendered = function.render(vnode.get_props(), vnode.get_children(), context);
        let rendered = self.create(&rendered, parent, context)?;
        if let Some(node) = rendered.node() {
            if let Some(hook) = &hooks.on_component_did_mount {
                self.effects.push(Effect::FunctionDidMount {
                    hook: hook.clone(),
                    node,
                    component: name,
                });
            }
            if let Some(callback) = vnode.ref_callback() {
                self.effects.attach(callback, node);
            }
        }
        Ok(Mounted::Function {
            vnode: vnode.clone(),
            rendered: Box::new(rendered),
        })
    }

    // =========================================================================
    // Patch
    // =========================================================================

    /// Bring `mounted` in line with `next`.
    pub(crate) fn patch(
        &mut self,
        mounted: &mut Mounted,
        next: &VNode,
        parent: NodeId,
        context: &Context,
    ) -> Result<(), ReconcileError> {
        if !mounted.vnode().same_slot(next) {
            return self.replace(mounted, next, parent, context);
        }

        match mounted {
            Mounted::Element {
                vnode,
                node,
                children,
            } => {
                let node = *node;
                self.patch_props(node, vnode.get_props(), next.get_props());
                self.patch_children(node, children, next.get_children(), context)?;
                self.patch_ref(vnode.ref_callback(), next.ref_callback(), Some(node));
                *vnode = next.clone();
            }
            Mounted::Text { vnode, node } => {
                if vnode.text_content() != next.text_content() {
                    self.target
                        .set_text(*node, next.text_content().unwrap_or_default());
                }
                self.patch_ref(vnode.ref_callback(), next.ref_callback(), Some(*node));
                *vnode = next.clone();
            }
            Mounted::Void { vnode, .. } => *vnode = next.clone(),
            Mounted::Class { vnode, instance } => {
                let instance = instance.clone();
                self.update_instance(&instance, Some((next, context)), State::new(), false)?;
                let node = instance.borrow().root_node();
                self.patch_ref(vnode.ref_callback(), next.ref_callback(), node);
                *vnode = next.clone();
            }
            Mounted::Function { vnode, rendered } => {
                if let Tag::Function(function) = next.tag() {
                    self.update_function(vnode, rendered, function, next, parent, context)?;
                }
            }
        }
        Ok(())
    }

    /// Swap the occupant of a slot for an incompatible one.
    fn replace(
        &mut self,
        mounted: &mut Mounted,
        next: &VNode,
        parent: NodeId,
        context: &Context,
    ) -> Result<(), ReconcileError> {
        trace!(
            from = mounted.vnode().tag().name(),
            to = next.tag().name(),
            "replace"
        );
        let old_node = mounted.node();
        let fresh = match self.release(mounted) {
            Ok(()) => self.create(next, parent, context),
            Err(err) => Err(err),
        };
        let fresh = match fresh {
            Ok(fresh) => fresh,
            Err(err) => {
                // Keep only the old node: a later pass removes it without
                // releasing the occupant again.
                if let Some(node) = old_node {
                    *mounted = Mounted::Void {
                        vnode: VNode::null(),
                        node,
                    };
                }
                return Err(err);
            }
        };
        if let Some(node) = fresh.node() {
            self.target.insert(parent, node, old_node);
        }
        if let Some(old_node) = old_node {
            self.target.remove(old_node);
        }
        *mounted = fresh;
        Ok(())
    }

    fn patch_props(&mut self, node: NodeId, prev: &Props, next: &Props) {
        for (key, value) in next {
            if prev.get(key) != Some(value) {
                self.target.set_property(node, key, value);
            }
        }
        for key in prev.keys() {
            if !next.contains_key(key) {
                self.target.set_property(node, key, &Value::Null);
            }
        }
    }

    fn patch_children(
        &mut self,
        parent: NodeId,
        children: &mut Vec<Mounted>,
        next: &[VNode],
        context: &Context,
    ) -> Result<(), ReconcileError> {
        if self.options.keyed && keyed::is_keyed(children, next) {
            return self.patch_keyed(parent, children, next, context);
        }

        let common = children.len().min(next.len());
        for (mounted, vnode) in children.iter_mut().zip(next) {
            self.patch(mounted, vnode, parent, context)?;
        }
        if children.len() > common {
            for mounted in children.split_off(common) {
                self.unmount(mounted)?;
            }
        }
        for vnode in &next[common..] {
            let mounted = self.create(vnode, parent, context)?;
            if let Some(node) = mounted.node() {
                self.target.insert(parent, node, None);
            }
            children.push(mounted);
        }
        Ok(())
    }

    /// Unchanged callbacks are left alone; a changed one is detached and the
    /// new one attached.
    fn patch_ref(
        &mut self,
        prev: Option<&RefCallback>,
        next: Option<&RefCallback>,
        node: Option<NodeId>,
    ) {
        if let (Some(prev), Some(next)) = (prev, next) {
            if prev.ptr_eq(next) {
                return;
            }
        }
        if let Some(prev) = prev {
            self.effects.detach(prev);
        }
        if let (Some(next), Some(node)) = (next, node) {
            self.effects.attach(next, node);
        }
    }

    // =========================================================================
    // Component updates
    // =========================================================================

    /// Run the update cycle of a stateful instance.
    ///
    /// `next` carries the vnode and context of a parent-driven update; a
    /// self-initiated update passes `None` and re-renders with the props and
    /// context it already has. Updates for instances that are not mounted
    /// are dropped.
    pub(crate) fn update_instance(
        &mut self,
        instance: &InstanceRef,
        next: Option<(&VNode, &Context)>,
        patch: State,
        force: bool,
    ) -> Result<(), ReconcileError> {
        let mut inst = instance.borrow_mut();
        if inst.phase() != Phase::Mounted {
            trace!(component = inst.name(), phase = ?inst.phase(), "update dropped");
            return Ok(());
        }
        inst.set_phase(Phase::Updating);
        let result = self.run_update(instance, &mut inst, next, patch, force);
        inst.set_phase(Phase::Mounted);
        result
    }

    fn run_update(
        &mut self,
        instance: &InstanceRef,
        inst: &mut Instance,
        next: Option<(&VNode, &Context)>,
        mut patch: State,
        mut force: bool,
    ) -> Result<(), ReconcileError> {
        if next.is_some() {
            // Pending batched state rides along with the parent's render.
            let owed = self
                .driver
                .upgrade()
                .and_then(|driver| driver.scheduler().absorb(inst.id()));
            if let Some(owed) = owed {
                trace!(component = inst.name(), "pending update applied with parent render");
                merge_map(&mut patch, owed.patch);
                force |= owed.force;
            }
        }
        let next_vnode = match next {
            Some((vnode, context)) => {
                inst.context = context.clone();
                vnode.clone()
            }
            None => inst.vnode.clone(),
        };
        let mut next_state = inst.state.clone();
        merge_map(&mut next_state, patch);

        if next.is_some() {
            inst.will_receive_props(next_vnode.get_props(), &mut next_state)?;
        }
        if !force && !inst.should_update(next_vnode.get_props(), &next_state)? {
            trace!(component = inst.name(), "update skipped by shouldComponentUpdate");
            inst.vnode = next_vnode;
            inst.state = next_state;
            return Ok(());
        }
        inst.will_update(next_vnode.get_props(), &next_state)?;

        let prev_props = std::mem::replace(&mut inst.vnode, next_vnode).get_props().clone();
        let prev_state = std::mem::replace(&mut inst.state, next_state);

        let child_context = inst.child_context();
        let scope = inst.context.push(child_context);
        let rendered = inst.render();
        let parent = inst.parent;
        if let Some(mounted) = inst.rendered.as_mut() {
            self.patch(mounted, &rendered, parent, &scope)?;
        }

        self.effects.push(Effect::DidUpdate {
            instance: instance.clone(),
            prev_props,
            prev_state,
        });
        Ok(())
    }

    /// Re-run a function component, gated by `onComponentShouldUpdate`.
    fn update_function(
        &mut self,
        vnode: &mut VNode,
        rendered: &mut Mounted,
        function: &FunctionComponent,
        next: &VNode,
        parent: NodeId,
        context: &Context,
    ) -> Result<(), ReconcileError> {
        let name = function.name();
        let hooks = next.hooks();
        let prev_props = vnode.get_props();
        let next_props = next.get_props();

        if let Some(gate) = &hooks.on_component_should_update {
            let proceed = gate(prev_props, next_props)
                .map_err(|source| ReconcileError::hook(HookKind::ShouldUpdate, name, source))?;
            if !proceed {
                trace!(component = name, "update skipped by onComponentShouldUpdate");
                self.patch_ref(vnode.ref_callback(), next.ref_callback(), rendered.node());
                *vnode = next.clone();
                return Ok(());
            }
        }
        if let Some(hook) = &hooks.on_component_will_update {
            hook(prev_props, next_props)
                .map_err(|source| ReconcileError::hook(HookKind::WillUpdate, name, source))?;
        }

        let next_rendered = function.render(next_props, next.get_children(), context);
        self.patch(rendered, &next_rendered, parent, context)?;

        if let Some(hook) = &hooks.on_component_did_update {
            self.effects.push(Effect::FunctionDidUpdate {
                hook: hook.clone(),
                prev: prev_props.clone(),
                next: next_props.clone(),
                component: name,
            });
        }
        self.patch_ref(vnode.ref_callback(), next.ref_callback(), rendered.node());
        *vnode = next.clone();
        Ok(())
    }

    // =========================================================================
    // Unmount
    // =========================================================================

    /// Release `mounted` and remove its root node from the target.
    pub(crate) fn unmount(&mut self, mut mounted: Mounted) -> Result<(), ReconcileError> {
        let node = mounted.node();
        trace!(node = ?node, tag = mounted.vnode().tag().name(), "unmount");
        self.release(&mut mounted)?;
        if let Some(node) = node {
            self.target.remove(node);
        }
        Ok(())
    }

    /// Walk a subtree that is leaving the tree.
    ///
    /// `willUnmount` hooks fire pre-order, before anything is removed. Ref
    /// detaches are queued post-order. Target nodes are left in place; the
    /// caller removes the subtree root.
    fn release(&mut self, mounted: &mut Mounted) -> Result<(), ReconcileError> {
        match mounted {
            Mounted::Element {
                vnode, children, ..
            } => {
                for child in children.iter_mut() {
                    self.release(child)?;
                }
                if let Some(callback) = vnode.ref_callback() {
                    self.effects.detach(callback);
                }
            }
            Mounted::Text { vnode, .. } => {
                if let Some(callback) = vnode.ref_callback() {
                    self.effects.detach(callback);
                }
            }
            Mounted::Void { .. } => {}
            Mounted::Class { vnode, instance } => {
                let rendered = {
                    let mut inst = instance.borrow_mut();
                    // Exactly once, however many ancestors leave together.
                    if inst.phase() != Phase::Mounted {
                        return Ok(());
                    }
                    inst.set_phase(Phase::Unmounting);
                    inst.will_unmount()?;
                    inst.rendered.take()
                };
                if let Some(mut rendered) = rendered {
                    self.release(&mut rendered)?;
                }
                instance.borrow_mut().set_phase(Phase::Unmounted);
                if let Some(callback) = vnode.ref_callback() {
                    self.effects.detach(callback);
                }
            }
            Mounted::Function { vnode, rendered } => {
                if let (Some(hook), Some(node)) =
                    (&vnode.hooks().on_component_will_unmount, rendered.node())
                {
                    let name = vnode.tag().component_name().unwrap_or_default();
                    hook(node)
                        .map_err(|source| ReconcileError::hook(HookKind::WillUnmount, name, source))?;
                }
                self.release(rendered)?;
                if let Some(callback) = vnode.ref_callback() {
                    self.effects.detach(callback);
                }
            }
        }
        Ok(())
    }
}
