use super::Value;
use std::fmt;

/// A raw result row produced by the query collaborator during a streaming load.
pub type Row = Vec<Value>;

/// Identity of the entity that holds a collection.
///
/// This is a weak back-reference: the proxy never owns the entity, it stores
/// the key and leaves resolution to the session's identity map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey {
    entity: String,
    id: Value,
}

impl OwnerKey {
    pub fn new(entity: impl Into<String>, id: Value) -> Self {
        Self {
            entity: entity.into(),
            id,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn id(&self) -> &Value {
        &self.id
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.id)
    }
}

/// The role a collection plays on its owning entity, e.g. `Order.lines`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRole(String);

impl CollectionRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CollectionRole {
    fn from(role: &str) -> Self {
        Self::new(role)
    }
}
