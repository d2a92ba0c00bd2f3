//! The virtual node.
//!
//! A `VNode` is an immutable description of one tree position for one render
//! pass. Nodes are built with consuming builder methods:
//!
//! ```ignore
//! use spark_vdom::VNode;
//!
//! let tree = VNode::element("div")
//!     .prop("class", "card")
//!     .child(VNode::element("span").child(VNode::text("title")))
//!     .child_opt(show_footer.then(|| VNode::element("footer")));
//! ```

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::flags::{VNodeFlags, VNodeKind};
use super::hooks::{LifecycleHooks, RefCallback};
use crate::component::{ComponentClass, FunctionComponent};
use crate::error::{HookError, HookResult};
use crate::types::{object_to_map, Key, NodeId, Props};

// =============================================================================
// Tag
// =============================================================================

/// What a node is an instance of.
///
/// Type compatibility across renders is decided by identity: element tags by
/// name, components by the shared class or function handle.
#[derive(Clone)]
pub enum Tag {
    Element(Rc<str>),
    Class(ComponentClass),
    Function(FunctionComponent),
    /// Text and null nodes carry no tag.
    None,
}

impl Tag {
    pub fn same_type(&self, other: &Tag) -> bool {
        match (self, other) {
            (Tag::Element(a), Tag::Element(b)) => a == b,
            (Tag::Class(a), Tag::Class(b)) => a.ptr_eq(b),
            (Tag::Function(a), Tag::Function(b)) => a.ptr_eq(b),
            (Tag::None, Tag::None) => true,
            _ => false,
        }
    }

    /// Name of a component tag.
    pub fn component_name(&self) -> Option<&'static str> {
        match self {
            Tag::Class(class) => Some(class.name()),
            Tag::Function(function) => Some(function.name()),
            _ => None,
        }
    }

    /// Tag or component name, for logs.
    pub fn name(&self) -> &str {
        match self {
            Tag::Element(name) => name,
            Tag::Class(class) => class.name(),
            Tag::Function(function) => function.name(),
            Tag::None => "",
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Element(name) => write!(f, "Element({name})"),
            Tag::Class(class) => write!(f, "Class({})", class.name()),
            Tag::Function(function) => write!(f, "Function({})", function.name()),
            Tag::None => f.write_str("None"),
        }
    }
}

// =============================================================================
// VNode
// =============================================================================

/// Immutable description of one tree position.
///
/// Cloning is cheap: the data is shared, and builders copy it only when it is
/// shared at the time of the call.
#[derive(Clone)]
pub struct VNode {
    inner: Rc<VNodeData>,
}

#[derive(Clone)]
struct VNodeData {
    flags: VNodeFlags,
    tag: Tag,
    props: Props,
    children: Vec<VNode>,
    text: Option<Rc<str>>,
    key: Option<Key>,
    ref_callback: Option<RefCallback>,
    hooks: LifecycleHooks,
}

impl VNode {
    fn with_tag(flags: VNodeFlags, tag: Tag) -> Self {
        Self {
            inner: Rc::new(VNodeData {
                flags,
                tag,
                props: Props::new(),
                children: Vec::new(),
                text: None,
                key: None,
                ref_callback: None,
                hooks: LifecycleHooks::default(),
            }),
        }
    }

    fn data_mut(&mut self) -> &mut VNodeData {
        Rc::make_mut(&mut self.inner)
    }

    /// Host element, e.g. `div`.
    pub fn element(tag: impl AsRef<str>) -> Self {
        Self::with_tag(VNodeFlags::ELEMENT, Tag::Element(Rc::from(tag.as_ref())))
    }

    /// Text node.
    pub fn text(content: impl AsRef<str>) -> Self {
        let mut node = Self::with_tag(VNodeFlags::TEXT, Tag::None);
        node.data_mut().text = Some(Rc::from(content.as_ref()));
        node
    }

    /// Empty slot.
    pub fn null() -> Self {
        Self::with_tag(VNodeFlags::VOID, Tag::None)
    }

    /// Stateful component.
    pub fn component(class: &ComponentClass) -> Self {
        Self::with_tag(VNodeFlags::COMPONENT_CLASS, Tag::Class(class.clone()))
    }

    /// Stateless function component.
    pub fn function(function: &FunctionComponent) -> Self {
        Self::with_tag(VNodeFlags::COMPONENT_FUNCTION, Tag::Function(function.clone()))
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Set one prop.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data_mut().props.insert(key.into(), value.into());
        self
    }

    /// Merge a JSON object into the props.
    pub fn props(mut self, props: Value) -> Self {
        let data = self.data_mut();
        for (key, value) in object_to_map(props) {
            data.props.insert(key, value);
        }
        self
    }

    /// Append a child.
    pub fn child(mut self, child: VNode) -> Self {
        self.data_mut().children.push(child);
        self
    }

    /// Append a child, or an empty slot for `None`.
    pub fn child_opt(self, child: Option<VNode>) -> Self {
        self.child(child.unwrap_or_else(VNode::null))
    }

    /// Append several children.
    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.data_mut().children.extend(children);
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.data_mut().key = Some(key.into());
        self
    }

    /// The `ref` prop.
    pub fn with_ref(mut self, callback: RefCallback) -> Self {
        self.data_mut().ref_callback = Some(callback);
        self
    }

    pub fn on_component_will_mount(mut self, hook: impl Fn(&Props) -> HookResult + 'static) -> Self {
        self.data_mut().hooks.on_component_will_mount = Some(Rc::new(hook));
        self
    }

    pub fn on_component_did_mount(mut self, hook: impl Fn(NodeId) -> HookResult + 'static) -> Self {
        self.data_mut().hooks.on_component_did_mount = Some(Rc::new(hook));
        self
    }

    pub fn on_component_will_unmount(
        mut self,
        hook: impl Fn(NodeId) -> HookResult + 'static,
    ) -> Self {
        self.data_mut().hooks.on_component_will_unmount = Some(Rc::new(hook));
        self
    }

    pub fn on_component_should_update(
        mut self,
        hook: impl Fn(&Props, &Props) -> Result<bool, HookError> + 'static,
    ) -> Self {
        self.data_mut().hooks.on_component_should_update = Some(Rc::new(hook));
        self
    }

    pub fn on_component_will_update(
        mut self,
        hook: impl Fn(&Props, &Props) -> HookResult + 'static,
    ) -> Self {
        self.data_mut().hooks.on_component_will_update = Some(Rc::new(hook));
        self
    }

    pub fn on_component_did_update(
        mut self,
        hook: impl Fn(&Props, &Props) -> HookResult + 'static,
    ) -> Self {
        self.data_mut().hooks.on_component_did_update = Some(Rc::new(hook));
        self
    }

    /// Replace all lifecycle hooks at once.
    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.data_mut().hooks = hooks;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn flags(&self) -> VNodeFlags {
        self.inner.flags
    }

    pub fn kind(&self) -> VNodeKind {
        self.inner.flags.kind()
    }

    pub fn tag(&self) -> &Tag {
        &self.inner.tag
    }

    /// Element tag name, `None` for non-elements.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.inner.tag {
            Tag::Element(name) => Some(name),
            _ => None,
        }
    }

    pub fn get_props(&self) -> &Props {
        &self.inner.props
    }

    pub fn get_children(&self) -> &[VNode] {
        &self.inner.children
    }

    pub fn text_content(&self) -> Option<&str> {
        self.inner.text.as_deref()
    }

    pub fn get_key(&self) -> Option<&Key> {
        self.inner.key.as_ref()
    }

    pub fn ref_callback(&self) -> Option<&RefCallback> {
        self.inner.ref_callback.as_ref()
    }

    pub fn hooks(&self) -> &LifecycleHooks {
        &self.inner.hooks
    }

    /// Whether `other` can be patched into the slot this node occupies.
    ///
    /// Requires equal kind, identical tag and equal key.
    pub fn same_slot(&self, other: &VNode) -> bool {
        self.flags() == other.flags()
            && self.get_key() == other.get_key()
            && self.tag().same_type(other.tag())
    }

    /// Whether both handles share the same node data.
    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = &self.inner;
        let mut out = f.debug_struct("VNode");
        out.field("kind", &self.kind()).field("tag", &data.tag);
        if let Some(text) = &data.text {
            out.field("text", text);
        }
        if !data.props.is_empty() {
            out.field("props", &data.props);
        }
        if let Some(key) = &data.key {
            out.field("key", key);
        }
        if !data.children.is_empty() {
            out.field("children", &data.children);
        }
        out.finish()
    }
}

impl From<&str> for VNode {
    fn from(content: &str) -> Self {
        VNode::text(content)
    }
}

impl From<String> for VNode {
    fn from(content: String) -> Self {
        VNode::text(content)
    }
}

impl From<Option<VNode>> for VNode {
    fn from(node: Option<VNode>) -> Self {
        node.unwrap_or_else(VNode::null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_builder() {
        let node = VNode::element("div")
            .prop("class", "c")
            .props(json!({ "id": "main" }))
            .child(VNode::text("hi"))
            .child_opt(None);

        assert_eq!(node.kind(), VNodeKind::Element);
        assert_eq!(node.tag_name(), Some("div"));
        assert_eq!(node.get_props().get("class"), Some(&json!("c")));
        assert_eq!(node.get_props().get("id"), Some(&json!("main")));
        assert_eq!(node.get_children().len(), 2);
        assert_eq!(node.get_children()[0].text_content(), Some("hi"));
        assert_eq!(node.get_children()[1].kind(), VNodeKind::Null);
    }

    #[test]
    fn test_same_slot_elements() {
        let a = VNode::element("div");
        assert!(a.same_slot(&VNode::element("div").prop("x", 1)));
        assert!(!a.same_slot(&VNode::element("span")));
        assert!(!a.same_slot(&VNode::text("div")));
        assert!(VNode::text("a").same_slot(&VNode::text("b")));
        assert!(VNode::null().same_slot(&VNode::null()));
        assert!(!VNode::null().same_slot(&VNode::text("")));
    }

    #[test]
    fn test_same_slot_respects_keys() {
        let a = VNode::element("li").key(1);
        assert!(a.same_slot(&VNode::element("li").key(1)));
        assert!(!a.same_slot(&VNode::element("li").key(2)));
        assert!(!a.same_slot(&VNode::element("li")));
    }

    #[test]
    fn test_same_slot_components_by_identity() {
        let render = |_: &Props, _: &[VNode], _: &crate::Context| None;
        let first = FunctionComponent::new("Same", render);
        let second = FunctionComponent::new("Same", render);

        assert!(VNode::function(&first).same_slot(&VNode::function(&first.clone())));
        assert!(!VNode::function(&first).same_slot(&VNode::function(&second)));
    }

    #[test]
    fn test_builder_copies_shared_data() {
        let base = VNode::element("div").prop("a", 1);
        let shared = base.clone();
        assert!(shared.ptr_eq(&base));

        let extended = shared.prop("b", 2);
        assert!(!extended.ptr_eq(&base));
        assert_eq!(base.get_props().len(), 1);
        assert_eq!(extended.get_props().len(), 2);
    }

    #[test]
    fn test_hook_builders() {
        let node = VNode::element("div")
            .on_component_did_update(|_, _| Ok(()))
            .on_component_should_update(|prev, next| Ok(prev != next));
        assert!(node.hooks().on_component_did_update.is_some());
        assert!(node.hooks().on_component_should_update.is_some());
        assert!(node.hooks().on_component_will_mount.is_none());
    }
}
