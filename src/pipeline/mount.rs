//! Render entry point.
//!
//! A [`Renderer`] owns a target tree and remembers, per container, the tree
//! last rendered into it. Every call reconciles against that tree.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::{MemoryTree, Renderer, VNode};
//!
//! let mut tree = MemoryTree::new();
//! let root = tree.create_container();
//! let renderer = Renderer::new(tree);
//!
//! // Mount
//! renderer.render(Some(VNode::element("p").child(VNode::text("one"))), root)?;
//!
//! // Patch: only the text node changes
//! renderer.render(Some(VNode::element("p").child(VNode::text("two"))), root)?;
//!
//! // Unmount everything in the container
//! renderer.render(None, root)?;
//! ```
//!
//! # Borrowing the target
//!
//! [`with_target`](Renderer::with_target) borrows the target tree. Hooks that
//! run while the target is being mutated (`willMount`, `willReceiveProps`,
//! `shouldUpdate`, `willUpdate`, `willUnmount`, render functions) must not
//! call it. `didMount`, `didUpdate` and ref callbacks run after the mutation
//! phase and may.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::scheduler::{run, Driver, Job, Scheduler};
use crate::component::InstanceRef;
use crate::engine::{EffectQueue, Mounted, Reconciler};
use crate::error::{ReconcileError, RefError};
use crate::target::{MemoryTree, TargetTree};
use crate::types::{NodeId, State};
use crate::vnode::VNode;

// =============================================================================
// Options
// =============================================================================

/// Renderer behavior toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererOptions {
    /// Match fully keyed child lists by key. When off, children are always
    /// matched by position.
    pub keyed: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self { keyed: true }
    }
}

impl RendererOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyed(mut self, keyed: bool) -> Self {
        self.keyed = keyed;
        self
    }
}

// =============================================================================
// Renderer internals
// =============================================================================

pub(crate) struct RendererInner<T: TargetTree> {
    this: Weak<RendererInner<T>>,
    target: RefCell<T>,
    roots: RefCell<HashMap<NodeId, Mounted>>,
    scheduler: Scheduler,
    options: RendererOptions,
    ref_errors: RefCell<Vec<RefError>>,
}

impl<T: TargetTree + 'static> RendererInner<T> {
    fn driver(&self) -> Weak<dyn Driver> {
        self.this.clone()
    }

    fn render_root(&self, container: NodeId, vnode: Option<VNode>) -> Result<(), ReconcileError> {
        debug!(%container, unmount = vnode.is_none(), "render pass");
        let old = self.roots.borrow_mut().remove(&container);
        let mut effects = EffectQueue::new();
        let (tree, result) = {
            let mut target = self.target.borrow_mut();
            let mut reconciler =
                Reconciler::new(&mut *target, &mut effects, self.driver(), &self.options);
            reconciler.render_root(old, vnode.as_ref(), container)
        };
        if let Some(tree) = tree {
            self.roots.borrow_mut().insert(container, tree);
        }
        self.flush_effects(effects, result.err())
    }

    fn update_instance(
        &self,
        instance: &InstanceRef,
        patch: State,
        force: bool,
    ) -> Result<(), ReconcileError> {
        let mut effects = EffectQueue::new();
        let result = self.reconcile_instance(&mut effects, instance, patch, force);
        self.flush_effects(effects, result.err())
    }

    fn reconcile_instance(
        &self,
        effects: &mut EffectQueue,
        instance: &InstanceRef,
        patch: State,
        force: bool,
    ) -> Result<(), ReconcileError> {
        let mut target = self.target.borrow_mut();
        let mut reconciler = Reconciler::new(&mut *target, effects, self.driver(), &self.options);
        reconciler.update_instance(instance, None, patch, force)
    }

    /// Render every pending update as one pass. The did-hooks of the whole
    /// batch run after the last instance was patched, and not at all when
    /// one of them fails.
    fn flush_pending(&self) -> Result<(), ReconcileError> {
        let count = self.scheduler.begin_flush();
        if count == 0 {
            return Ok(());
        }
        debug!(updates = count, "flushing batched updates");
        let mut effects = EffectQueue::new();
        let mut failed = None;
        while let Some(update) = self.scheduler.next_flushing() {
            let Some(instance) = update.instance.upgrade() else {
                continue;
            };
            if let Err(source) =
                self.reconcile_instance(&mut effects, &instance, update.patch, update.force)
            {
                failed = Some(ReconcileError::Flush {
                    component: update.name,
                    source: Box::new(source),
                });
                break;
            }
        }
        self.flush_effects(effects, failed)
    }

    fn flush_effects(
        &self,
        effects: EffectQueue,
        failed: Option<ReconcileError>,
    ) -> Result<(), ReconcileError> {
        let mut ref_errors = Vec::new();
        let result = effects.flush(failed, &mut ref_errors);
        if !ref_errors.is_empty() {
            self.ref_errors.borrow_mut().extend(ref_errors);
        }
        result
    }
}

impl<T: TargetTree + 'static> Driver for RendererInner<T> {
    fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn execute(&self, job: Job) -> Result<(), ReconcileError> {
        match job {
            Job::Render { container, vnode } => self.render_root(container, vnode),
            Job::Update {
                instance,
                patch,
                force,
            } => match instance.upgrade() {
                Some(instance) => {
                    debug!(component = instance.borrow().name(), force, "instance update");
                    self.update_instance(&instance, patch, force)
                }
                None => Ok(()),
            },
            Job::Flush => self.flush_pending(),
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Handle to a target tree and the trees rendered into its containers.
///
/// Single-threaded: the handle is neither `Send` nor `Sync`. Clones share
/// the same renderer. Dropping the last handle drops every mounted tree
/// without running `willUnmount`; render `None` first to unmount properly.
pub struct Renderer<T: TargetTree + 'static> {
    inner: Rc<RendererInner<T>>,
}

impl<T: TargetTree + 'static> Clone for Renderer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: TargetTree + 'static> Renderer<T> {
    pub fn new(target: T) -> Self {
        Self::with_options(target, RendererOptions::default())
    }

    pub fn with_options(target: T, options: RendererOptions) -> Self {
        let inner = Rc::new_cyclic(|this| RendererInner {
            this: this.clone(),
            target: RefCell::new(target),
            roots: RefCell::new(HashMap::new()),
            scheduler: Scheduler::default(),
            options,
            ref_errors: RefCell::new(Vec::new()),
        });
        Self { inner }
    }

    /// Render `vnode` into `container`, or unmount the container's tree for
    /// `None`.
    ///
    /// Called from inside a hook, the render is queued and runs after the
    /// current pass.
    pub fn render(&self, vnode: Option<VNode>, container: NodeId) -> Result<(), ReconcileError> {
        run(&*self.inner, Job::Render { container, vnode })
    }

    /// Render all pending batched updates now.
    pub fn flush(&self) -> Result<(), ReconcileError> {
        run(&*self.inner, Job::Flush)
    }

    /// Run `f`, then flush the updates it batched.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R, ReconcileError> {
        let out = f();
        self.flush()?;
        Ok(out)
    }

    /// Whether batched updates are waiting for a flush.
    pub fn has_pending(&self) -> bool {
        self.inner.scheduler.pending_len() > 0
    }

    /// Whether a pass is running right now.
    pub fn is_rendering(&self) -> bool {
        self.inner.scheduler.is_in_flight()
    }

    /// Whether `container` has a mounted tree.
    pub fn is_mounted(&self, container: NodeId) -> bool {
        self.inner.roots.borrow().contains_key(&container)
    }

    /// Borrow the target tree.
    ///
    /// # Panics
    ///
    /// When called while the target is being mutated (see the module docs).
    pub fn with_target<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.target.borrow())
    }

    /// Mutably borrow the target tree, e.g. to create another container.
    ///
    /// # Panics
    ///
    /// Same as [`with_target`](Self::with_target).
    pub fn with_target_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.target.borrow_mut())
    }

    /// Ref callback failures recorded since the last call.
    pub fn take_ref_errors(&self) -> Vec<RefError> {
        std::mem::take(&mut *self.inner.ref_errors.borrow_mut())
    }

    pub fn options(&self) -> &RendererOptions {
        &self.inner.options
    }

    pub fn downgrade(&self) -> WeakRenderer<T> {
        WeakRenderer {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Renderer<MemoryTree> {
    /// Serialized contents of `container`.
    pub fn inner_html(&self, container: NodeId) -> String {
        self.with_target(|tree| tree.inner_html(container))
    }
}

/// Non-owning renderer handle, for hooks that need to reach their renderer.
pub struct WeakRenderer<T: TargetTree + 'static> {
    inner: Weak<RendererInner<T>>,
}

impl<T: TargetTree + 'static> Clone for WeakRenderer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: TargetTree + 'static> WeakRenderer<T> {
    pub fn upgrade(&self) -> Option<Renderer<T>> {
        self.inner.upgrade().map(|inner| Renderer { inner })
    }
}
