// ============================================================================
// Element-Type Collaborator
// ============================================================================
//
// The proxy never inspects element contents itself. Everything per-element
// (deep copy, dirty comparison, row hydration, cache (de)serialization) is
// delegated to an ElementType implementation chosen at mapping-load time.
//
// ============================================================================

use crate::core::{DataType, OwnerKey, ProxyError, Result, Row, Value};

/// The disassembled, cache-safe form of one element.
pub type CacheValue = serde_json::Value;

/// Per-element services consumed by the collection proxy.
pub trait ElementType: Send + Sync + std::fmt::Debug {
    /// Deep copy used when capturing a snapshot. The copy must compare equal
    /// to the original under the element's identity.
    fn deep_copy(&self, value: &Value) -> Value;

    /// Whether `current` has changed relative to `loaded`.
    ///
    /// `loaded` is the snapshot's deep copy, `current` the live element found
    /// under the same identity.
    fn is_dirty(&self, loaded: &Value, current: &Value) -> bool;

    /// Convert one raw result row into an element.
    fn hydrate_row(&self, row: &Row) -> Result<Value>;

    /// Serialize one element for the second-level cache.
    fn disassemble(&self, value: &Value) -> Result<CacheValue>;

    /// Reconstruct one element from its cached form.
    fn assemble(&self, cached: &CacheValue, owner: &OwnerKey) -> Result<Value>;
}

/// Element type for value-typed elements of a single data type.
///
/// Identity is full equality, so a "changed" basic element is simply a
/// different element; `is_dirty` only ever fires when the caller compares two
/// structurally different values under the same identity, which basic
/// equality rules out. It is kept honest anyway.
#[derive(Debug, Clone)]
pub struct BasicElementType {
    data_type: DataType,
}

impl BasicElementType {
    pub fn new(data_type: DataType) -> Self {
        Self { data_type }
    }

    fn check(&self, value: &Value) -> Result<()> {
        if !self.data_type.is_compatible(value) {
            return Err(ProxyError::TypeMismatch(format!(
                "element of type {} expected, got {}",
                self.data_type,
                value.type_name()
            )));
        }
        Ok(())
    }
}

impl ElementType for BasicElementType {
    fn deep_copy(&self, value: &Value) -> Value {
        value.clone()
    }

    fn is_dirty(&self, loaded: &Value, current: &Value) -> bool {
        loaded != current
    }

    fn hydrate_row(&self, row: &Row) -> Result<Value> {
        let value = row.first().cloned().unwrap_or(Value::Null);
        self.check(&value)?;
        Ok(value)
    }

    fn disassemble(&self, value: &Value) -> Result<CacheValue> {
        self.check(value)?;
        Ok(serde_json::to_value(value)?)
    }

    fn assemble(&self, cached: &CacheValue, _owner: &OwnerKey) -> Result<Value> {
        let value: Value = serde_json::from_value(cached.clone())?;
        self.check(&value)?;
        Ok(value)
    }
}

/// Element type for entity-typed elements.
///
/// Identity is entity name plus id; dirtiness is a change in the state
/// vector of an element that kept its identity.
#[derive(Debug, Clone)]
pub struct EntityElementType {
    entity: String,
}

impl EntityElementType {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    fn check<'a>(&self, value: &'a Value) -> Result<&'a crate::core::EntityRef> {
        match value.as_entity() {
            Some(entity) if entity.entity == self.entity => Ok(entity),
            Some(entity) => Err(ProxyError::TypeMismatch(format!(
                "entity element of '{}' expected, got '{}'",
                self.entity, entity.entity
            ))),
            None => Err(ProxyError::TypeMismatch(format!(
                "entity element of '{}' expected, got {}",
                self.entity,
                value.type_name()
            ))),
        }
    }
}

impl ElementType for EntityElementType {
    fn deep_copy(&self, value: &Value) -> Value {
        // clone carries the state vector, which is exactly what the
        // snapshot needs to compare against later
        value.clone()
    }

    fn is_dirty(&self, loaded: &Value, current: &Value) -> bool {
        match (loaded.as_entity(), current.as_entity()) {
            (Some(old), Some(new)) => old.state != new.state,
            _ => loaded != current,
        }
    }

    fn hydrate_row(&self, row: &Row) -> Result<Value> {
        let (id, state) = match row.split_first() {
            Some((id, rest)) => (id.clone(), rest.to_vec()),
            None => {
                return Err(ProxyError::TypeMismatch(format!(
                    "empty row cannot hydrate an element of entity '{}'",
                    self.entity
                )));
            }
        };
        Ok(Value::entity(self.entity.clone(), id, state))
    }

    fn disassemble(&self, value: &Value) -> Result<CacheValue> {
        let entity = self.check(value)?;
        Ok(serde_json::to_value(entity)?)
    }

    fn assemble(&self, cached: &CacheValue, _owner: &OwnerKey) -> Result<Value> {
        let entity: crate::core::EntityRef = serde_json::from_value(cached.clone())?;
        let value = Value::Entity(entity);
        self.check(&value)?;
        Ok(value)
    }
}
