//! Target tree interface.
//!
//! The reconciler never touches a concrete UI. It drives whatever implements
//! [`TargetTree`]: a browser DOM binding, a terminal cell tree, or the
//! in-memory [`MemoryTree`] used by the tests.
//!
//! Contract the reconciler relies on:
//!
//! - `create_node` returns a detached node. Elements are created bare; their
//!   properties arrive through `set_property`. Text nodes carry their initial
//!   content. Null nodes become placeholders that render as nothing.
//! - `insert` places `node` under `parent` before `before`, or last when
//!   `before` is `None`. Inserting an attached node moves it.
//! - `remove` detaches a node together with its subtree.
//! - `set_property` with `Value::Null` clears the property.

pub mod memory;

pub use memory::{MemoryTree, TargetOp};

use serde_json::Value;

use crate::types::NodeId;
use crate::vnode::VNode;

/// Mutation primitives of a live tree.
pub trait TargetTree {
    /// Create a detached node for an element, text or null vnode.
    fn create_node(&mut self, vnode: &VNode) -> NodeId;

    fn insert(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>);

    fn remove(&mut self, node: NodeId);

    fn set_property(&mut self, node: NodeId, key: &str, value: &Value);

    fn set_text(&mut self, node: NodeId, text: &str);
}
