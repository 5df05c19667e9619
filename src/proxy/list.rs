// ============================================================================
// List-Shaped Collection Proxy
// ============================================================================
//
// The indexed variant layered on the same state machine. Only the mechanics
// that differ from sets live here: duplicates are admitted, adds queue
// without a presence probe, and positional access goes through the
// IndexedAccess capability.
//
// ============================================================================

use super::base::CollectionProxy;
use super::container::Container;
use super::operation::DelayedOperation;
use super::IndexedAccess;
use crate::core::{OwnerKey, ProxyError, Result, Value};
use crate::mapping::{CollectionMapping, ContainerShape};
use crate::session::SessionContext;

/// A lazily loaded persistent list.
#[derive(Debug)]
pub struct ListProxy {
    base: CollectionProxy,
}

impl ListProxy {
    pub fn new(owner: OwnerKey, mapping: CollectionMapping) -> Result<Self> {
        Self::check_shape(&mapping)?;
        Ok(Self {
            base: CollectionProxy::new(owner, mapping)?,
        })
    }

    pub fn from_existing(
        owner: OwnerKey,
        mapping: CollectionMapping,
        values: Vec<Value>,
    ) -> Result<Self> {
        Self::check_shape(&mapping)?;
        Ok(Self {
            base: CollectionProxy::from_existing(owner, mapping, Container::List(values))?,
        })
    }

    fn check_shape(mapping: &CollectionMapping) -> Result<()> {
        if mapping.shape() != ContainerShape::List {
            return Err(ProxyError::UnsupportedOperation(format!(
                "list proxy over a {}-shaped mapping '{}'",
                mapping.shape(),
                mapping.role()
            )));
        }
        Ok(())
    }

    pub fn base(&self) -> &CollectionProxy {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut CollectionProxy {
        &mut self.base
    }

    pub fn len(&mut self, session: &dyn SessionContext) -> Result<usize> {
        self.base.initialize(false, session)?;
        Ok(self.base.container().len())
    }

    pub fn elements(&mut self, session: &dyn SessionContext) -> Result<Vec<Value>> {
        self.base.initialize(false, session)?;
        Ok(self.base.container().iter().cloned().collect())
    }

    /// Append one element. Duplicates are fine, so an unloaded list can queue
    /// the add with no probe at all.
    pub fn add(&mut self, element: Value, session: &dyn SessionContext) -> Result<()> {
        if self.base.is_initialized() {
            self.base.container_mut().insert(element);
            self.base.mark_dirty();
            return Ok(());
        }
        if self.base.queueing_allowed(session) {
            self.base.queue_operation(DelayedOperation::Add(element));
            return Ok(());
        }
        self.base.initialize(true, session)?;
        self.base.container_mut().insert(element);
        self.base.mark_dirty();
        Ok(())
    }

    /// Remove the first occurrence. Positional knowledge is required, so this
    /// always loads.
    pub fn remove(&mut self, element: &Value, session: &dyn SessionContext) -> Result<bool> {
        self.base.initialize(true, session)?;
        let changed = self.base.container_mut().remove(element);
        if changed {
            self.base.mark_dirty();
        }
        Ok(changed)
    }

    pub fn clear(&mut self, session: &dyn SessionContext) -> Result<()> {
        if self.base.is_initialized() {
            if self.base.container_mut().clear() {
                self.base.mark_dirty();
            }
            return Ok(());
        }
        if self.base.queueing_allowed(session) {
            self.base.queue_operation(DelayedOperation::Clear);
            return Ok(());
        }
        self.base.initialize(true, session)?;
        if self.base.container_mut().clear() {
            self.base.mark_dirty();
        }
        Ok(())
    }
}

impl IndexedAccess for ListProxy {
    fn element_at(&mut self, index: usize, session: &dyn SessionContext) -> Result<Value> {
        self.base.initialize(false, session)?;
        self.base.container().element_at(index).cloned()
    }

    fn set_element_at(
        &mut self,
        index: usize,
        element: Value,
        session: &dyn SessionContext,
    ) -> Result<Value> {
        self.base.initialize(true, session)?;
        let old = self.base.container_mut().set_element_at(index, element)?;
        self.base.mark_dirty();
        Ok(old)
    }
}
