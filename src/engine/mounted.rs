//! The mounted tree.
//!
//! For every vnode currently rendered the reconciler keeps one `Mounted`
//! entry: the vnode it was last patched with plus whatever it owns in the
//! target. The next render is diffed against this tree.
//!
//! Every entry has exactly one root target node. Null slots own a placeholder
//! and components own the root of what they rendered, so a sibling list is
//! always a list of nodes that can serve as insertion anchors.

use crate::component::InstanceRef;
use crate::types::NodeId;
use crate::vnode::VNode;

pub(crate) enum Mounted {
    Element {
        vnode: VNode,
        node: NodeId,
        children: Vec<Mounted>,
    },
    Text {
        vnode: VNode,
        node: NodeId,
    },
    /// Empty slot backed by a placeholder node. Also left behind by a
    /// replacement that failed after the old occupant was released.
    Void {
        vnode: VNode,
        node: NodeId,
    },
    Class {
        vnode: VNode,
        instance: InstanceRef,
    },
    Function {
        vnode: VNode,
        rendered: Box<Mounted>,
    },
}

impl Mounted {
    /// The vnode this entry was last patched with.
    pub(crate) fn vnode(&self) -> &VNode {
        match self {
            Mounted::Element { vnode, .. }
            | Mounted::Text { vnode, .. }
            | Mounted::Void { vnode, .. }
            | Mounted::Class { vnode, .. }
            | Mounted::Function { vnode, .. } => vnode,
        }
    }

    /// Root target node. `None` only for a released component.
    ///
    /// Resolved through component instances each time, so a component that
    /// replaced its own root is always reported correctly.
    pub(crate) fn node(&self) -> Option<NodeId> {
        match self {
            Mounted::Element { node, .. } | Mounted::Text { node, .. } | Mounted::Void { node, .. } => {
                Some(*node)
            }
            Mounted::Class { instance, .. } => instance.borrow().root_node(),
            Mounted::Function { rendered, .. } => rendered.node(),
        }
    }
}
