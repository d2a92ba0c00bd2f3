//! Core types for spark-vdom.
//!
//! These types are shared by every layer: the virtual node model, the
//! component instances, the reconciler and the target tree interface.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

// =============================================================================
// Node handles
// =============================================================================

/// Handle to a node living in a [`TargetTree`](crate::target::TargetTree).
///
/// The target owns the node. A `NodeId` is only a name for it, so holding one
/// never keeps a node alive and comparing two of them is an identity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Wrap a raw target-specific index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw index this handle was created from.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Value maps
// =============================================================================

/// Props passed to an element or component.
pub type Props = Map<String, Value>;

/// Component state. Owned by one instance, patched through `set_state`.
pub type State = Map<String, Value>;

/// Values a component publishes to its descendants.
pub type ChildContext = Map<String, Value>;

/// Shallow-merge `patch` into `target`, later keys winning.
pub(crate) fn merge_map(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Convert a JSON object into a map. Anything else yields an empty map.
pub fn object_to_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            tracing::warn!(value = %other, "expected a JSON object, ignoring value");
            Map::new()
        }
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Identity of a child inside a keyed child list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    /// Unsigned keys past `i64::MAX`; everything smaller is an `Int`.
    Uint(u64),
    Str(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(value) => write!(f, "{value}"),
            Key::Uint(value) => write!(f, "{value}"),
            Key::Str(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Key::Uint(value), Key::Int)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        // usize is at most 64 bits wide.
        Key::from(value as u64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_map_overrides_and_keeps() {
        let mut state = object_to_map(json!({ "a": 1, "b": 2 }));
        merge_map(&mut state, object_to_map(json!({ "b": 3, "c": 4 })));

        assert_eq!(Value::Object(state), json!({ "a": 1, "b": 3, "c": 4 }));
    }

    #[test]
    fn test_object_to_map_rejects_non_objects() {
        assert!(object_to_map(json!(null)).is_empty());
        assert!(object_to_map(json!([1, 2])).is_empty());
        assert_eq!(object_to_map(json!({ "x": true })).len(), 1);
    }

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from(3), Key::Int(3));
        assert_eq!(Key::from("a"), Key::from(String::from("a")));
        assert_ne!(Key::from(1), Key::from("1"));
        assert_eq!(Key::from("row").to_string(), "row");
    }

    #[test]
    fn test_unsigned_keys_do_not_wrap() {
        assert_eq!(Key::from(7usize), Key::Int(7));
        assert_eq!(Key::from(u64::MAX), Key::Uint(u64::MAX));
        assert_ne!(Key::from(u64::MAX), Key::Int(-1));
        assert_eq!(Key::from(u64::MAX).to_string(), "18446744073709551615");
    }
}
