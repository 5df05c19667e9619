// ============================================================================
// Set-Shaped Collection Proxy
// ============================================================================

use super::base::CollectionProxy;
use super::operation::DelayedOperation;
use super::SetAlgebra;
use crate::core::{OwnerKey, ProxyError, Result, Value};
use crate::mapping::{CollectionMapping, ContainerShape};
use crate::proxy::container::Container;
use crate::session::{Presence, SessionContext};
use std::collections::HashSet;

/// A lazily loaded persistent set.
///
/// Every operation decides, through the shared state machine, whether to
/// force initialization, queue the mutation, or answer from the live set.
#[derive(Debug)]
pub struct SetProxy {
    base: CollectionProxy,
}

impl SetProxy {
    pub fn new(owner: OwnerKey, mapping: CollectionMapping) -> Result<Self> {
        Self::check_shape(&mapping)?;
        Ok(Self {
            base: CollectionProxy::new(owner, mapping)?,
        })
    }

    /// Wrap an already-populated set, bypassing lazy loading entirely.
    pub fn from_existing(
        owner: OwnerKey,
        mapping: CollectionMapping,
        values: HashSet<Value>,
    ) -> Result<Self> {
        Self::check_shape(&mapping)?;
        Ok(Self {
            base: CollectionProxy::from_existing(owner, mapping, Container::Set(values))?,
        })
    }

    fn check_shape(mapping: &CollectionMapping) -> Result<()> {
        if mapping.shape() != ContainerShape::Set {
            return Err(ProxyError::UnsupportedOperation(format!(
                "set proxy over a {}-shaped mapping '{}'",
                mapping.shape(),
                mapping.role()
            )));
        }
        Ok(())
    }

    /// Shared state machine, for the unit-of-work's diffing and cache calls.
    pub fn base(&self) -> &CollectionProxy {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut CollectionProxy {
        &mut self.base
    }

    // ------------------------------------------------------------------
    // Reads (force initialization)
    // ------------------------------------------------------------------

    pub fn len(&mut self, session: &dyn SessionContext) -> Result<usize> {
        self.base.initialize(false, session)?;
        Ok(self.base.container().len())
    }

    pub fn is_empty(&mut self, session: &dyn SessionContext) -> Result<bool> {
        Ok(self.len(session)? == 0)
    }

    pub fn elements(&mut self, session: &dyn SessionContext) -> Result<Vec<Value>> {
        self.base.initialize(false, session)?;
        Ok(self.base.container().iter().cloned().collect())
    }

    /// Membership test; answered by a probe when possible, loading otherwise.
    pub fn contains(&mut self, element: &Value, session: &dyn SessionContext) -> Result<bool> {
        match self.contains_probe(element, session) {
            Presence::Present => Ok(true),
            Presence::Absent => Ok(false),
            Presence::Unknown => {
                self.base.initialize(false, session)?;
                Ok(self.base.container().contains(element))
            }
        }
    }

    /// Tri-state membership that never triggers a load: the live set answers
    /// once initialized; an unloaded set answers from its own pending queue
    /// first, then from the session's identity map / targeted existence
    /// probe, otherwise `Unknown`.
    ///
    /// The queue takes precedence over stored state: a queued mutation is a
    /// change the caller already made, and dispatching against storage alone
    /// would contradict it.
    pub fn contains_probe(&self, element: &Value, session: &dyn SessionContext) -> Presence {
        if self.base.is_initialized() {
            if self.base.container().contains(element) {
                Presence::Present
            } else {
                Presence::Absent
            }
        } else {
            match self.base.queued_presence(element) {
                Presence::Unknown => {
                    session.probe_membership(self.base.owner(), self.base.role(), element)
                }
                known => known,
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutations (dispatch policy)
    // ------------------------------------------------------------------

    fn apply_add(&mut self, element: Value) -> bool {
        let changed = self.base.container_mut().insert(element);
        if changed {
            self.base.mark_dirty();
        }
        changed
    }

    fn apply_remove(&mut self, element: &Value) -> bool {
        let changed = self.base.container_mut().remove(element);
        if changed {
            self.base.mark_dirty();
        }
        changed
    }

    /// Add one element. Queues when the session allows it and a probe can
    /// rule out prior membership; loads otherwise.
    ///
    /// A queued add reports success optimistically.
    pub fn add(&mut self, element: Value, session: &dyn SessionContext) -> Result<bool> {
        if self.base.is_initialized() {
            return Ok(self.apply_add(element));
        }
        if !self.base.queueing_allowed(session) {
            self.base.initialize(true, session)?;
            return Ok(self.apply_add(element));
        }
        match self.contains_probe(&element, session) {
            Presence::Absent => {
                self.base.queue_operation(DelayedOperation::Add(element));
                Ok(true)
            }
            Presence::Present => Ok(false),
            Presence::Unknown => {
                self.base.initialize(true, session)?;
                Ok(self.apply_add(element))
            }
        }
    }

    /// Remove one element, queueing under the same policy as `add`.
    pub fn remove(&mut self, element: &Value, session: &dyn SessionContext) -> Result<bool> {
        if self.base.is_initialized() {
            return Ok(self.apply_remove(element));
        }
        if !self.base.queueing_allowed(session) {
            self.base.initialize(true, session)?;
            return Ok(self.apply_remove(element));
        }
        match self.contains_probe(element, session) {
            Presence::Present => {
                self.base
                    .queue_operation(DelayedOperation::Remove(element.clone()));
                Ok(true)
            }
            Presence::Absent => Ok(false),
            Presence::Unknown => {
                self.base.initialize(true, session)?;
                Ok(self.apply_remove(element))
            }
        }
    }

    pub fn add_all(
        &mut self,
        elements: impl IntoIterator<Item = Value>,
        session: &dyn SessionContext,
    ) -> Result<bool> {
        let mut changed = false;
        for element in elements {
            changed |= self.add(element, session)?;
        }
        Ok(changed)
    }

    /// Remove every listed element. Never queues; always loads first.
    pub fn remove_all(&mut self, elements: &[Value], session: &dyn SessionContext) -> Result<bool> {
        self.base.initialize(true, session)?;
        let mut changed = false;
        for element in elements {
            changed |= self.apply_remove(element);
        }
        Ok(changed)
    }

    /// Drop everything not in `retained`. Never queues; always loads first.
    pub fn retain_all(
        &mut self,
        retained: &HashSet<Value>,
        session: &dyn SessionContext,
    ) -> Result<bool> {
        self.base.initialize(true, session)?;
        let doomed: Vec<Value> = self
            .base
            .container()
            .iter()
            .filter(|element| !retained.contains(element))
            .cloned()
            .collect();
        let mut changed = false;
        for element in &doomed {
            changed |= self.apply_remove(element);
        }
        Ok(changed)
    }

    /// Empty the set. Enqueueable without a presence probe.
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

impl SetAlgebra for SetProxy {
    fn union_with(
        &mut self,
        other: &HashSet<Value>,
        session: &dyn SessionContext,
    ) -> Result<HashSet<Value>> {
        self.base.initialize(false, session)?;
        let mut union: HashSet<Value> = self.base.container().iter().cloned().collect();
        union.extend(other.iter().cloned());
        Ok(union)
    }

    fn intersection_with(
        &mut self,
        other: &HashSet<Value>,
        session: &dyn SessionContext,
    ) -> Result<HashSet<Value>> {
        self.base.initialize(false, session)?;
        Ok(self
            .base
            .container()
            .iter()
            .filter(|element| other.contains(element))
            .cloned()
            .collect())
    }
}
