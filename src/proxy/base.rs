// ============================================================================
// Collection Proxy State Machine
// ============================================================================
//
// Owns the lazy-initialization lifecycle, the live container, the delayed
// operation queue and the snapshot diffing used for dirty checking. Concrete
// shapes (SetProxy, ListProxy) express their operations in terms of the
// primitives here.
//
// Single-threaded by contract: one proxy belongs to exactly one unit-of-work.
//
// ============================================================================

use super::container::Container;
use super::operation::DelayedOperation;
use super::snapshot::Snapshot;
use super::state::LoadState;
use crate::core::{CollectionRole, OwnerKey, ProxyError, Result, Row, Value};
use crate::element::CacheValue;
use crate::mapping::CollectionMapping;
use crate::session::{Presence, SessionContext};
use log::{debug, trace};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct CollectionProxy {
    owner: OwnerKey,
    mapping: CollectionMapping,
    state: LoadState,
    container: Container,
    snapshot: Option<Snapshot>,
    queue: VecDeque<DelayedOperation>,
    dirty: bool,
    directly_accessible: bool,
    read_buffer: Option<Vec<Value>>,
}

impl CollectionProxy {
    /// Create an uninitialized proxy; no storage read happens until first
    /// access demands one.
    pub fn new(owner: OwnerKey, mapping: CollectionMapping) -> Result<Self> {
        let container = Container::for_shape(mapping.shape())?;
        Ok(Self {
            owner,
            mapping,
            state: LoadState::Uninitialized,
            container,
            snapshot: None,
            queue: VecDeque::new(),
            dirty: false,
            directly_accessible: false,
            read_buffer: None,
        })
    }

    /// Wrap an already-materialized container.
    ///
    /// The collection starts `Initialized` with no snapshot; it is treated as
    /// up to date on first flush and a snapshot is taken lazily if it is ever
    /// compared.
    pub fn from_existing(
        owner: OwnerKey,
        mapping: CollectionMapping,
        container: Container,
    ) -> Result<Self> {
        if container.shape() != mapping.shape() {
            return Err(ProxyError::TypeMismatch(format!(
                "{}-shaped container given to a {}-shaped mapping",
                container.shape(),
                mapping.shape()
            )));
        }
        Ok(Self {
            owner,
            mapping,
            state: LoadState::Initialized,
            container,
            snapshot: None,
            queue: VecDeque::new(),
            dirty: false,
            directly_accessible: true,
            read_buffer: None,
        })
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    pub fn role(&self) -> &CollectionRole {
        self.mapping.role()
    }

    pub fn mapping(&self) -> &CollectionMapping {
        &self.mapping
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    pub fn is_directly_accessible(&self) -> bool {
        self.directly_accessible
    }

    /// Read-only view of the live container. Meaningful only once
    /// initialized; collaborators never mutate it directly.
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub(crate) fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    fn reentrant(&self) -> ProxyError {
        ProxyError::ReentrantInitialization {
            owner: self.owner.clone(),
            role: self.role().clone(),
        }
    }

    // ------------------------------------------------------------------
    // Lazy initialization: one load, run to completion or failure
    // ------------------------------------------------------------------

    /// Ensure the collection is `Initialized` before returning.
    ///
    /// `writing` hints that the caller mutates immediately afterwards; it
    /// marks the collection dirty proactively and changes nothing else.
    ///
    /// # Errors
    /// `ReentrantInitialization` if a load is already in flight;
    /// `LoadFailure` if the session collaborator fails, in which case the
    /// state stays `Initializing` and the instance must be discarded.
    pub fn initialize(&mut self, writing: bool, session: &dyn SessionContext) -> Result<()> {
        match self.state {
            LoadState::Initialized => Ok(()),
            LoadState::Initializing => Err(self.reentrant()),
            LoadState::Uninitialized => {
                debug!(
                    "loading collection '{}' of {} (writing={})",
                    self.role(),
                    self.owner,
                    writing
                );
                self.begin_read()?;
                session.load_collection(self).map_err(|err| ProxyError::LoadFailure {
                    owner: self.owner.clone(),
                    role: self.mapping.role().clone(),
                    cause: err.to_string(),
                })?;
                self.end_read()?;
                if writing {
                    self.dirty = true;
                }
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Streaming load protocol
    // ------------------------------------------------------------------

    /// Start a streaming load: allocate the accumulation buffer.
    ///
    /// The live container is untouched until `end_read`.
    pub fn begin_read(&mut self) -> Result<()> {
        if self.state.is_loading() {
            return Err(self.reentrant());
        }
        self.read_buffer = Some(Vec::new());
        self.state = LoadState::Initializing;
        Ok(())
    }

    /// Convert one raw row to an element and accumulate it.
    ///
    /// The converted element is returned so the caller can keep fetching
    /// related sub-graphs keyed by the same row. Duplicate detection is
    /// deferred to `end_read`: element equality is not invoked on partially
    /// hydrated elements.
    pub fn read_from(&mut self, row: &Row) -> Result<Value> {
        let element = self.mapping.element_type().hydrate_row(row)?;
        match self.read_buffer.as_mut() {
            Some(buffer) => {
                buffer.push(element.clone());
                Ok(element)
            }
            None => Err(ProxyError::UnsupportedOperation(
                "read_from called outside of an active load".into(),
            )),
        }
    }

    /// Complete a streaming load.
    ///
    /// Bulk-merges the buffer into a fresh live container (de-duplicating,
    /// now that elements are fully hydrated), captures the snapshot of the
    /// loaded contents, replays queued operations in FIFO order exactly
    /// once, and transitions to `Initialized`.
    ///
    /// The snapshot is taken before the replay: queued mutations must stay
    /// visible to the diff, otherwise they would never reach storage.
    pub fn end_read(&mut self) -> Result<bool> {
        let buffer = self.read_buffer.take().ok_or_else(|| {
            ProxyError::UnsupportedOperation("end_read called outside of an active load".into())
        })?;
        let loaded_count = buffer.len();

        let mut container = Container::for_shape(self.mapping.shape())?;
        container.merge_loaded(buffer);

        let snapshot = if self.directly_accessible {
            None
        } else {
            Some(Snapshot::capture(&container, self.mapping.element_type()))
        };

        let mut replay_changed = false;
        let queued = std::mem::take(&mut self.queue);
        for operation in queued {
            replay_changed |= operation.replay(&mut container);
        }

        debug!(
            "collection '{}' of {} initialized: {} rows loaded, {} live elements",
            self.mapping.role(),
            self.owner,
            loaded_count,
            container.len()
        );

        self.container = container;
        self.snapshot = snapshot;
        if replay_changed {
            self.dirty = true;
        }
        self.state = LoadState::Initialized;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Delayed operation queue
    // ------------------------------------------------------------------

    /// Whether a mutation may be queued instead of forcing a load.
    pub fn queueing_allowed(&self, session: &dyn SessionContext) -> bool {
        !self.state.is_initialized() && session.queueing_enabled(self.role())
    }

    pub(crate) fn queue_operation(&mut self, operation: DelayedOperation) {
        trace!(
            "queueing {:?} on collection '{}' of {}",
            operation,
            self.mapping.role(),
            self.owner
        );
        self.queue.push_back(operation);
    }

    pub fn has_queued_operations(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Presence of `element` according to the pending queue alone.
    ///
    /// Scanned newest-first: a pending add means present, a pending remove or
    /// a trailing clear means absent, `Unknown` when no queued operation
    /// touches the element. Dispatch must consult this before any stored-state
    /// probe, otherwise a decision based on storage would contradict a
    /// mutation the caller already issued.
    pub fn queued_presence(&self, element: &Value) -> Presence {
        for operation in self.queue.iter().rev() {
            match operation {
                DelayedOperation::Add(value) if value == element => return Presence::Present,
                DelayedOperation::Remove(value) if value == element => return Presence::Absent,
                DelayedOperation::Clear => return Presence::Absent,
                _ => {}
            }
        }
        Presence::Unknown
    }

    /// Pending operations in enqueue order, for the owner's cascade
    /// bookkeeping (`added_instance` / `orphan` views).
    pub fn pending_operations(&self) -> impl Iterator<Item = &DelayedOperation> {
        self.queue.iter()
    }

    // ------------------------------------------------------------------
    // Dirty checking against the snapshot
    // ------------------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn get_snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Whether the live contents are unchanged relative to the snapshot.
    ///
    /// True iff sizes match and every live element has a non-dirty loaded
    /// counterpart. Short-circuits on the first mismatch. This is the single
    /// predicate the unit-of-work uses to skip flush work entirely.
    pub fn equals_snapshot(&mut self) -> Result<bool> {
        let Some(snapshot) = &self.snapshot else {
            if self.directly_accessible {
                // first comparison of a wrapped collection: take the baseline
                // now and report it clean
                let snapshot = Snapshot::capture(&self.container, self.mapping.element_type());
                self.snapshot = Some(snapshot);
                return Ok(true);
            }
            return Err(ProxyError::UnsupportedOperation(format!(
                "no snapshot for collection '{}': it was never initialized",
                self.mapping.role()
            )));
        };

        if self.container.len() != snapshot.len() {
            return Ok(false);
        }
        let element_type = self.mapping.element_type();
        for element in self.container.iter() {
            match snapshot.get(element) {
                Some(loaded) if !element_type.is_dirty(loaded, element) => continue,
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Elements the flush must delete: snapshot elements no longer present
    /// in the live container, then loaded counterparts of dirty live
    /// elements (a changed element is deleted under its old value and
    /// re-inserted, see `needs_inserting`).
    ///
    /// `index_is_formula` only matters for indexed shapes and is ignored for
    /// sets.
    pub fn get_deletes(&self, index_is_formula: bool) -> Result<Vec<Value>> {
        let Some(snapshot) = &self.snapshot else {
            return Err(ProxyError::UnsupportedOperation(format!(
                "no snapshot for collection '{}': it was never initialized",
                self.mapping.role()
            )));
        };
        trace!(
            "computing deletes for collection '{}' of {} (index_is_formula={})",
            self.mapping.role(),
            self.owner,
            index_is_formula
        );

        let element_type = self.mapping.element_type();
        let mut deletes = Vec::new();
        for loaded in snapshot.iter() {
            if !self.container.contains(loaded) {
                deletes.push(loaded.clone());
            }
        }
        for current in self.container.iter() {
            if let Some(loaded) = snapshot.get(current) {
                if element_type.is_dirty(loaded, current) {
                    deletes.push(loaded.clone());
                }
            }
        }
        Ok(deletes)
    }

    /// Whether `entry` must be inserted at flush: it has no loaded
    /// counterpart, or its counterpart is dirty (replacement of a changed
    /// element, paired with the delete from `get_deletes`).
    pub fn needs_inserting(&self, entry: &Value) -> Result<bool> {
        let Some(snapshot) = &self.snapshot else {
            return Err(ProxyError::UnsupportedOperation(format!(
                "no snapshot for collection '{}': it was never initialized",
                self.mapping.role()
            )));
        };
        match snapshot.get(entry) {
            None => Ok(true),
            Some(loaded) => Ok(self.mapping.element_type().is_dirty(loaded, entry)),
        }
    }

    /// Snapshot elements absent from the live container, under the
    /// container's native equality. Pure set computation; cascading the
    /// deletions is the caller's responsibility.
    pub fn get_orphans(
        snapshot: &Snapshot,
        current: &Container,
        owner_entity: &str,
    ) -> Vec<Value> {
        trace!("computing orphans for a collection of '{}'", owner_entity);
        snapshot
            .iter()
            .filter(|loaded| !current.contains(loaded))
            .cloned()
            .collect()
    }

    /// Called by the unit-of-work after a successful flush: the current
    /// contents become the new baseline and the dirty flag resets.
    pub fn post_flush(&mut self) -> Result<()> {
        if !self.state.is_initialized() {
            return Err(ProxyError::UnsupportedOperation(format!(
                "cannot re-baseline collection '{}' in state {}",
                self.mapping.role(),
                self.state
            )));
        }
        let snapshot = Snapshot::capture(&self.container, self.mapping.element_type());
        self.snapshot = Some(snapshot);
        self.dirty = false;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Second-level cache round-trip
    // ------------------------------------------------------------------

    /// Serialize the live contents for the second-level cache.
    pub fn disassemble(&self) -> Result<Vec<CacheValue>> {
        if !self.state.is_initialized() {
            return Err(ProxyError::UnsupportedOperation(format!(
                "cannot disassemble collection '{}' in state {}",
                self.mapping.role(),
                self.state
            )));
        }
        let element_type = self.mapping.element_type();
        self.container
            .iter()
            .map(|element| element_type.disassemble(element))
            .collect()
    }

    /// Populate the collection from disassembled cache values.
    ///
    /// Equivalent to a completed load: the container holds the assembled
    /// elements, a snapshot is captured, queued operations are replayed and
    /// drained, and the state is `Initialized`.
    pub fn initialize_from_cache(&mut self, cached: &[CacheValue], owner: &OwnerKey) -> Result<()> {
        if self.state.is_loading() {
            return Err(self.reentrant());
        }
        debug!(
            "assembling collection '{}' of {} from cache ({} values)",
            self.mapping.role(),
            self.owner,
            cached.len()
        );

        let element_type = self.mapping.element_type();
        let mut assembled = Vec::with_capacity(cached.len());
        for value in cached {
            assembled.push(element_type.assemble(value, owner)?);
        }

        let mut container = Container::for_shape(self.mapping.shape())?;
        container.merge_loaded(assembled);
        let snapshot = Snapshot::capture(&container, self.mapping.element_type());

        let mut replay_changed = false;
        let queued = std::mem::take(&mut self.queue);
        for operation in queued {
            replay_changed |= operation.replay(&mut container);
        }

        self.container = container;
        self.snapshot = Some(snapshot);
        if replay_changed {
            self.dirty = true;
        }
        self.state = LoadState::Initialized;
        Ok(())
    }
}
