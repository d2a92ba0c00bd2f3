//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rstest::fixture;
use spark_vdom::{MemoryTree, NodeId, RefCallback, Renderer};

/// Event log shared between a test and the components it renders.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Entries since the last call.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }
}

pub struct Harness {
    pub renderer: Renderer<MemoryTree>,
    pub root: NodeId,
}

impl Harness {
    pub fn html(&self) -> String {
        self.renderer.inner_html(self.root)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        self.renderer.with_target(|tree| tree.outer_html(node))
    }
}

#[fixture]
pub fn harness() -> Harness {
    let mut tree = MemoryTree::new();
    let root = tree.create_container();
    Harness {
        renderer: Renderer::new(tree),
        root,
    }
}

/// Ref callback that logs `name:attach` or `name:detach` and keeps the last
/// attached node in `slot`.
pub fn logging_ref(log: &Log, name: &'static str, slot: Rc<RefCell<Option<NodeId>>>) -> RefCallback {
    let log = log.clone();
    RefCallback::new(move |node| {
        match node {
            Some(_) => log.push(format!("{name}:attach")),
            None => log.push(format!("{name}:detach")),
        }
        *slot.borrow_mut() = node;
        Ok(())
    })
}
