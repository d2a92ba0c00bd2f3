//! Reconciliation engine.
//!
//! - `Mounted`: the tree of what is currently rendered, one entry per vnode
//! - `EffectQueue`: refs and did-hooks owed by a pass, flushed after it
//! - `Reconciler`: the diff itself, mount/patch/unmount per slot
//! - keyed child matching with a longest-increasing-subsequence move pass
//!
//! # Pass shape
//!
//! ```text
//! Reconciler (target borrowed)          EffectQueue::flush (target free)
//! ─────────────────────────────         ─────────────────────────────────
//! willMount / willReceiveProps /        ref detaches + attaches
//! shouldUpdate / willUpdate /           didMount / didUpdate
//! willUnmount, render, target           (post-order, children first)
//! mutations, effects queued
//! ```

mod effects;
mod keyed;
mod mounted;
mod reconciler;

pub(crate) use effects::EffectQueue;
pub(crate) use mounted::Mounted;
pub(crate) use reconciler::Reconciler;
