//! # spark-vdom
//!
//! Virtual-DOM reconciliation engine for Rust.
//!
//! Describe the UI you want as a tree of [`VNode`]s; a [`Renderer`] diffs it
//! against what is already rendered and applies the minimal set of mutations
//! to a target tree through the [`TargetTree`] trait, while running the
//! component lifecycle, ref callbacks and context propagation in a fixed
//! order.
//!
//! ## Architecture
//!
//! ```text
//! Renderer::render(vnode, container)
//!     → scheduler (one pass at a time, re-entrant requests queued)
//!     → Reconciler (mount / patch / move / unmount per slot, hooks, context)
//!     → TargetTree mutations
//!     → effect flush (refs child-first, didMount / didUpdate)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, Key, prop/state maps)
//! - [`vnode`] - The virtual node model and its hook props
//! - [`component`] - Stateful and stateless components, lifecycle phases
//! - [`context`] - Ambient context scopes
//! - [`pipeline`] - Renderer handle, scheduler and updaters
//! - [`target`] - The target tree trait and an in-memory implementation
//! - [`error`] - Hook and reconcile errors

pub mod component;
pub mod context;
mod engine;
pub mod error;
pub mod pipeline;
pub mod target;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use types::*;

pub use component::{Component, ComponentClass, FunctionComponent, InstanceId, Phase, Scope};

pub use context::Context;

pub use error::{HookError, HookKind, HookResult, ReconcileError, RefError};

pub use pipeline::{Renderer, RendererOptions, Updater, WeakRenderer};

pub use target::{MemoryTree, TargetOp, TargetTree};

pub use vnode::{LifecycleHooks, RefCallback, Tag, VNode, VNodeFlags, VNodeKind};
