//! Components.
//!
//! A component node is one of two variants, dispatched by match in the
//! reconciler:
//!
//! - [`class`] - stateful components: a [`Component`] value per mount, with
//!   state, child context and the full lifecycle
//! - [`stateless`] - function components: no instance, lifecycle driven by
//!   hook props on the node
//! - [`instance`] - the reconciler's bookkeeping around a mounted class

pub mod class;
pub(crate) mod instance;
pub mod stateless;

pub use class::{Component, ComponentClass, Scope};
pub use instance::{InstanceId, Phase};
pub use stateless::FunctionComponent;

pub(crate) use instance::{Instance, InstanceRef};
