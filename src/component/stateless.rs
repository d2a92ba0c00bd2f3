//! Stateless function components.
//!
//! A function component has no instance. It is re-run on every parent update
//! and its lifecycle is driven by the `onComponent*` hook props carried on the
//! node that uses it (see [`LifecycleHooks`](crate::vnode::LifecycleHooks)).

use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::types::Props;
use crate::vnode::VNode;

type RenderFn = dyn Fn(&Props, &[VNode], &Context) -> Option<VNode>;

struct FunctionInner {
    name: &'static str,
    render: Box<RenderFn>,
}

/// Shared handle to a render function.
///
/// Like [`ComponentClass`](super::ComponentClass), identity is the handle:
/// two separately created functions never patch into each other's slot.
#[derive(Clone)]
pub struct FunctionComponent {
    inner: Rc<FunctionInner>,
}

impl FunctionComponent {
    pub fn new(
        name: &'static str,
        render: impl Fn(&Props, &[VNode], &Context) -> Option<VNode> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(FunctionInner {
                name,
                render: Box::new(render),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn ptr_eq(&self, other: &FunctionComponent) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the render function. `None` is an empty slot.
    pub fn render(&self, props: &Props, children: &[VNode], context: &Context) -> VNode {
        (self.inner.render)(props, children, context).unwrap_or_else(VNode::null)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FunctionComponent").field(&self.inner.name).finish()
    }
}
