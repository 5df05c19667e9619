use crate::core::{ProxyError, Result, Value};
use crate::mapping::ContainerShape;
use std::collections::HashSet;

/// The in-memory container owned by a collection proxy.
///
/// Shape-shared operations live here; index operations succeed only on the
/// list shape. Map-shaped collections are rejected earlier, at mapping
/// validation, so no map storage exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Set(HashSet<Value>),
    List(Vec<Value>),
}

impl Container {
    pub fn for_shape(shape: ContainerShape) -> Result<Self> {
        match shape {
            ContainerShape::Set => Ok(Self::Set(HashSet::new())),
            ContainerShape::List => Ok(Self::List(Vec::new())),
            ContainerShape::Map => Err(ProxyError::UnsupportedOperation(
                "map-shaped collections have no container storage".into(),
            )),
        }
    }

    pub fn shape(&self) -> ContainerShape {
        match self {
            Self::Set(_) => ContainerShape::Set,
            Self::List(_) => ContainerShape::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Set(set) => set.len(),
            Self::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, element: &Value) -> bool {
        match self {
            Self::Set(set) => set.contains(element),
            Self::List(list) => list.contains(element),
        }
    }

    /// Insert one element; returns whether the container changed.
    ///
    /// Lists admit duplicates, so a list insert always changes the container.
    pub fn insert(&mut self, element: Value) -> bool {
        match self {
            Self::Set(set) => set.insert(element),
            Self::List(list) => {
                list.push(element);
                true
            }
        }
    }

    /// Remove one element (the first occurrence, for lists); returns whether
    /// the container changed.
    pub fn remove(&mut self, element: &Value) -> bool {
        match self {
            Self::Set(set) => set.remove(element),
            Self::List(list) => match list.iter().position(|e| e == element) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            },
        }
    }

    /// Empty the container; returns whether it held anything.
    pub fn clear(&mut self) -> bool {
        let changed = !self.is_empty();
        match self {
            Self::Set(set) => set.clear(),
            Self::List(list) => list.clear(),
        }
        changed
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Self::Set(set) => Box::new(set.iter()),
            Self::List(list) => Box::new(list.iter()),
        }
    }

    /// Bulk-merge fully hydrated elements in one pass.
    ///
    /// This is where de-duplication finally happens for sets; it was
    /// deliberately not applied mid-stream on partially hydrated elements.
    pub fn merge_loaded(&mut self, elements: Vec<Value>) {
        match self {
            Self::Set(set) => set.extend(elements),
            Self::List(list) => list.extend(elements),
        }
    }

    pub fn element_at(&self, index: usize) -> Result<&Value> {
        match self {
            Self::Set(_) => Err(ProxyError::UnsupportedOperation(
                "index access on a set-shaped container".into(),
            )),
            Self::List(list) => list.get(index).ok_or_else(|| {
                ProxyError::UnsupportedOperation(format!(
                    "index {} out of bounds for list of {}",
                    index,
                    list.len()
                ))
            }),
        }
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set_element_at(&mut self, index: usize, element: Value) -> Result<Value> {
        match self {
            Self::Set(_) => Err(ProxyError::UnsupportedOperation(
                "index access on a set-shaped container".into(),
            )),
            Self::List(list) => match list.get_mut(index) {
                Some(slot) => Ok(std::mem::replace(slot, element)),
                None => Err(ProxyError::UnsupportedOperation(format!(
                    "index {} out of bounds for list of {}",
                    index,
                    list.len()
                ))),
            },
        }
    }
}
