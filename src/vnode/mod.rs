//! Virtual node model.
//!
//! - [`flags`] - `VNodeFlags` bitfield and the coarse `VNodeKind`
//! - [`hooks`] - ref callbacks and the stateless `onComponent*` hook props
//! - [`node`] - the `VNode` itself and its builders

pub mod flags;
pub mod hooks;
pub mod node;

pub use flags::{VNodeFlags, VNodeKind};
pub use hooks::{
    LifecycleHooks, NodeHook, RefCallback, ShouldUpdateHook, UpdateHook, WillMountHook,
};
pub use node::{Tag, VNode};
