use super::container::Container;
use crate::core::Value;
use crate::element::ElementType;
use std::collections::HashMap;

/// Immutable point-in-time copy of a collection's contents.
///
/// Entries map each deep-copied element to itself, keyed by the element's
/// identity, so a live element can be looked up to find the state it had at
/// load time. The element count is kept separately: for duplicate-bearing
/// list contents the map alone would under-count.
///
/// A snapshot is never mutated after capture; re-initialization replaces it
/// wholesale.
///
/// For list-shaped contents the map collapses duplicate entries, only the
/// count survives: dropping one of two equal entries shows up as a single
/// size mismatch (one delete), and a pure reordering is invisible to
/// `equals_snapshot`. Per-index diffing is not modeled here.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    entries: HashMap<Value, Value>,
    count: usize,
}

impl Snapshot {
    /// Deep-copy the container's current contents.
    pub fn capture(container: &Container, element_type: &dyn ElementType) -> Self {
        let mut entries = HashMap::with_capacity(container.len());
        for element in container.iter() {
            let copy = element_type.deep_copy(element);
            entries.insert(copy.clone(), copy);
        }
        Self {
            entries,
            count: container.len(),
        }
    }

    /// The loaded counterpart of `element`, found by element identity.
    pub fn get(&self, element: &Value) -> Option<&Value> {
        self.entries.get(element)
    }

    pub fn contains(&self, element: &Value) -> bool {
        self.entries.contains_key(element)
    }

    /// Element count at capture time.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }
}
