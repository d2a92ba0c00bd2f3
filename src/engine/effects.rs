//! Post-mutation effects: the ref registry and the did-hooks.
//!
//! While a pass mutates the target, the reconciler only records what it owes:
//! ref attaches and detaches, `didMount` and `didUpdate` calls. Entries are
//! pushed in post-order (a node after its children), so flushing the list
//! front to back yields:
//!
//! - refs child-before-parent, on attach and on detach
//! - a node's ref after its own `didMount`/`didUpdate`
//! - detaches of a replaced occupant before attaches of its replacement
//!
//! The queue is flushed once, after the target borrow of the pass has been
//! released, so hooks may inspect the target. Once anything has failed, hooks
//! are skipped but refs still run: every queued ref belongs to a node that is
//! in the target and in the mounted tree, so its attach or detach is owed.

use tracing::{trace, warn};

use crate::component::{InstanceRef, Phase};
use crate::error::{HookKind, ReconcileError, RefError};
use crate::types::{NodeId, Props, State};
use crate::vnode::{NodeHook, RefCallback, UpdateHook};

pub(crate) enum Effect {
    Ref {
        callback: RefCallback,
        node: Option<NodeId>,
    },
    DidMount {
        instance: InstanceRef,
    },
    DidUpdate {
        instance: InstanceRef,
        prev_props: Props,
        prev_state: State,
    },
    FunctionDidMount {
        hook: NodeHook,
        node: NodeId,
        component: &'static str,
    },
    FunctionDidUpdate {
        hook: UpdateHook,
        prev: Props,
        next: Props,
        component: &'static str,
    },
}

#[derive(Default)]
pub(crate) struct EffectQueue {
    effects: Vec<Effect>,
}

impl EffectQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Owe `callback` the attached node.
    pub(crate) fn attach(&mut self, callback: &RefCallback, node: NodeId) {
        self.push(Effect::Ref {
            callback: callback.clone(),
            node: Some(node),
        });
    }

    /// Owe `callback` a detach.
    pub(crate) fn detach(&mut self, callback: &RefCallback) {
        self.push(Effect::Ref {
            callback: callback.clone(),
            node: None,
        });
    }

    /// Forget everything queued since the queue was `mark` long.
    pub(crate) fn truncate(&mut self, mark: usize) {
        if self.effects.len() > mark {
            trace!(dropped = self.effects.len() - mark, "discarding effects of a failed subtree");
            self.effects.truncate(mark);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.effects.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Run every effect in order.
    ///
    /// `failed` carries the error of a pass that aborted during mutation. A
    /// failing ref callback is logged and recorded in `ref_errors`; the
    /// remaining effects still run. A failing hook, or an earlier failure,
    /// skips the hooks that follow but not the refs. The first error is
    /// returned.
    pub(crate) fn flush(
        self,
        failed: Option<ReconcileError>,
        ref_errors: &mut Vec<RefError>,
    ) -> Result<(), ReconcileError> {
        if self.is_empty() {
            return failed.map_or(Ok(()), Err);
        }
        trace!(effects = self.len(), failed = failed.is_some(), "flushing effects");

        let mut failed = failed;
        for effect in self.effects {
            match effect {
                Effect::Ref { callback, node } => {
                    if let Err(error) = callback.call(node) {
                        warn!(?node, %error, "ref callback failed");
                        ref_errors.push(RefError { node, error });
                    }
                }
                hook if failed.is_none() => {
                    if let Err(err) = run_hook(hook) {
                        failed = Some(err);
                    }
                }
                _ => {}
            }
        }
        failed.map_or(Ok(()), Err)
    }
}

fn run_hook(effect: Effect) -> Result<(), ReconcileError> {
    match effect {
        Effect::Ref { .. } => Ok(()),
        Effect::DidMount { instance } => {
            let mut instance = instance.borrow_mut();
            if instance.phase() == Phase::Mounted {
                instance.did_mount()?;
            }
            Ok(())
        }
        Effect::DidUpdate {
            instance,
            prev_props,
            prev_state,
        } => {
            let mut instance = instance.borrow_mut();
            if instance.phase() == Phase::Mounted {
                instance.did_update(&prev_props, &prev_state)?;
            }
            Ok(())
        }
        Effect::FunctionDidMount {
            hook,
            node,
            component,
        } => hook(node)
            .map_err(|source| ReconcileError::hook(HookKind::DidMount, component, source)),
        Effect::FunctionDidUpdate {
            hook,
            prev,
            next,
            component,
        } => hook(&prev, &next)
            .map_err(|source| ReconcileError::hook(HookKind::DidUpdate, component, source)),
    }
}
