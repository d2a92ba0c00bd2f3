//! In-memory target tree.
//!
//! `MemoryTree` keeps nodes in an arena and records every mutation it receives
//! in an operation log. It serializes to HTML, which makes tree shape easy to
//! assert on:
//!
//! ```ignore
//! let mut tree = MemoryTree::new();
//! let root = tree.create_container();
//! let renderer = Renderer::new(tree);
//!
//! renderer.render(Some(VNode::element("div").child(VNode::text("hi"))), root)?;
//! assert_eq!(renderer.with_target(|t| t.inner_html(root)), "<div>hi</div>");
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::Value;

use super::TargetTree;
use crate::types::NodeId;
use crate::vnode::{VNode, VNodeKind};

// =============================================================================
// Nodes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum NodeData {
    /// Container created by the host, not by the reconciler.
    Container,
    Element {
        tag: String,
        attrs: BTreeMap<String, Value>,
    },
    Text(String),
    /// Stand-in for an empty slot. Serializes to nothing.
    Placeholder,
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOp {
    /// `label` is the tag name, `#text` or `#empty`.
    Create { node: NodeId, label: String },
    Insert {
        parent: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    },
    Remove { node: NodeId },
    SetProperty {
        node: NodeId,
        key: String,
        value: Value,
    },
    SetText { node: NodeId, text: String },
}

// =============================================================================
// MemoryTree
// =============================================================================

/// Arena-backed [`TargetTree`] with an operation log.
#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: Vec<Option<Node>>,
    ops: Vec<TargetOp>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root container to render into. Not logged.
    pub fn create_container(&mut self) -> NodeId {
        self.alloc(NodeData::Container)
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Some(Node {
            data,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.node(id).and_then(|node| node.parent);
        if let Some(parent) = parent.and_then(|parent| self.node_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    fn free(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        for child in node.children {
            self.free(child);
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Whether the node exists (created and not removed).
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, containers included.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Element tag name.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&Value> {
        match &self.node(id)?.data {
            NodeData::Element { attrs, .. } => attrs.get(key),
            _ => None,
        }
    }

    pub fn is_placeholder(&self, id: NodeId) -> bool {
        matches!(self.node(id).map(|node| &node.data), Some(NodeData::Placeholder))
    }

    /// Every mutation since creation or the last [`clear_ops`](Self::clear_ops).
    pub fn ops(&self) -> &[TargetOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn take_ops(&mut self) -> Vec<TargetOp> {
        std::mem::take(&mut self.ops)
    }

    // -------------------------------------------------------------------------
    // HTML
    // -------------------------------------------------------------------------

    /// Serialized children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// Serialized `id` including itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Container => {
                for child in &node.children {
                    self.write_html(*child, out);
                }
            }
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    let value = match value {
                        Value::Null => continue,
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    let _ = write!(out, " {key}=\"{}\"", escape(&value, true));
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Placeholder => {}
        }
    }
}

fn escape(text: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================================
// TargetTree
// =============================================================================

impl TargetTree for MemoryTree {
    fn create_node(&mut self, vnode: &VNode) -> NodeId {
        let (data, label) = match vnode.kind() {
            VNodeKind::Element => {
                let tag = vnode.tag_name().unwrap_or_default().to_string();
                let label = tag.clone();
                (
                    NodeData::Element {
                        tag,
                        attrs: BTreeMap::new(),
                    },
                    label,
                )
            }
            VNodeKind::Text => (
                NodeData::Text(vnode.text_content().unwrap_or_default().to_string()),
                "#text".to_string(),
            ),
            VNodeKind::Null | VNodeKind::Component => {
                (NodeData::Placeholder, "#empty".to_string())
            }
        };
        let node = self.alloc(data);
        self.ops.push(TargetOp::Create { node, label });
        node
    }

    fn insert(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>) {
        if !self.contains(parent) || !self.contains(node) {
            tracing::warn!(%parent, %node, "insert of unknown node ignored");
            return;
        }
        self.ops.push(TargetOp::Insert {
            parent,
            node,
            before,
        });
        self.detach(node);

        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        let index = match before {
            Some(anchor) => match parent_node.children.iter().position(|c| *c == anchor) {
                Some(index) => index,
                None => {
                    tracing::warn!(%parent, %anchor, "insert anchor is not a child, appending");
                    parent_node.children.len()
                }
            },
            None => parent_node.children.len(),
        };
        parent_node.children.insert(index, node);
        if let Some(node) = self.node_mut(node) {
            node.parent = Some(parent);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if !self.contains(node) {
            tracing::warn!(%node, "remove of unknown node ignored");
            return;
        }
        self.ops.push(TargetOp::Remove { node });
        self.detach(node);
        self.free(node);
    }

    fn set_property(&mut self, node: NodeId, key: &str, value: &Value) {
        self.ops.push(TargetOp::SetProperty {
            node,
            key: key.to_string(),
            value: value.clone(),
        });
        match self.node_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Element { attrs, .. }) => {
                if value.is_null() {
                    attrs.remove(key);
                } else {
                    attrs.insert(key.to_string(), value.clone());
                }
            }
            _ => tracing::warn!(%node, key, "set_property on a non-element ignored"),
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.ops.push(TargetOp::SetText {
            node,
            text: text.to_string(),
        });
        match self.node_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Text(content)) => {
                content.clear();
                content.push_str(text);
            }
            _ => tracing::warn!(%node, "set_text on a non-text node ignored"),
        }
    }
}
