//! Context propagation.
//!
//! Context is an ambient map handed down the tree. A component that publishes
//! child context extends the map for its subtree only:
//!
//! ```text
//! App        {}                       pushes { theme: "dark" }
//! └─ Panel   { theme: "dark" }        pushes { theme: "light", dense: true }
//!    └─ Row  { theme: "light", dense: true }
//! └─ Footer  { theme: "dark" }
//! ```
//!
//! The reconciler threads a `Context` value through the traversal. Descending
//! into a component calls [`Context::push`], which returns the merged scope for
//! its children; ascending simply drops that value, restoring the parent's
//! scope. Nothing is stored globally between renders.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::types::ChildContext;

/// Immutable, cheaply cloned context scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Rc<Map<String, Value>>,
}

impl Context {
    /// Empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a key published by any ancestor.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Read a string value, if the key exists and holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Open a child scope: `child` merged over this scope, nearer keys winning.
    ///
    /// An empty `child` shares this scope's storage.
    pub fn push(&self, child: ChildContext) -> Context {
        if child.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.values).clone();
        for (key, value) in child {
            merged.insert(key, value);
        }
        Context {
            values: Rc::new(merged),
        }
    }

    /// True when both scopes share storage (no push happened in between).
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Context {
            values: Rc::new(values),
        }
    }
}
