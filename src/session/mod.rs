// ============================================================================
// Session Collaborator Interface
// ============================================================================
//
// The proxy is owned by exactly one unit-of-work. That unit-of-work supplies
// three services through `SessionContext`: the per-role queueing policy, the
// identity-map/existence probe, and the row-streaming data source that feeds
// the streaming load protocol.
//
// ============================================================================

use crate::core::{CollectionRole, OwnerKey, Row, Value};
use crate::proxy::CollectionProxy;
use std::cell::Cell;
use std::collections::HashMap;
use thiserror::Error;

/// Tri-state answer of an element-existence probe.
///
/// `Unknown` forces the caller to initialize before it can act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
    Unknown,
}

impl Presence {
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Failure produced by the session while streaming a collection load.
///
/// The proxy wraps this verbatim into `ProxyError::LoadFailure`, attaching
/// the owner identity and collection role.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct LoadError(pub String);

/// Services the owning unit-of-work provides to its collection proxies.
pub trait SessionContext {
    /// Whether mutations on this role may be queued instead of forcing a load.
    fn queueing_enabled(&self, role: &CollectionRole) -> bool;

    /// Answer element existence from the identity map or a targeted probe,
    /// without loading the collection.
    fn probe_membership(
        &self,
        owner: &OwnerKey,
        role: &CollectionRole,
        element: &Value,
    ) -> Presence;

    /// Stream the stored rows of `target` into it via `read_from`.
    ///
    /// The proxy has already called `begin_read`; the session must not call
    /// `end_read` or mutate the proxy in any other way.
    fn load_collection(&self, target: &mut CollectionProxy) -> std::result::Result<(), LoadError>;
}

/// In-memory session used by tests and examples.
///
/// Rows, probe answers and load failures are scripted per (owner, role);
/// `load_count` exposes how many loads were actually issued so callers can
/// assert that probing never forced one.
#[derive(Debug, Default)]
pub struct MemorySession {
    queueing: bool,
    rows: HashMap<(OwnerKey, CollectionRole), Vec<Row>>,
    presence: HashMap<(OwnerKey, CollectionRole), HashMap<Value, bool>>,
    failures: HashMap<(OwnerKey, CollectionRole), String>,
    loads: Cell<usize>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queueing(mut self, enabled: bool) -> Self {
        self.queueing = enabled;
        self
    }

    /// Seed the rows a load of (owner, role) will stream.
    pub fn seed_rows(&mut self, owner: &OwnerKey, role: &CollectionRole, rows: Vec<Row>) {
        self.rows.insert((owner.clone(), role.clone()), rows);
    }

    /// Script a definite probe answer for one element.
    pub fn script_presence(
        &mut self,
        owner: &OwnerKey,
        role: &CollectionRole,
        element: Value,
        present: bool,
    ) {
        self.presence
            .entry((owner.clone(), role.clone()))
            .or_default()
            .insert(element, present);
    }

    /// Make the next loads of (owner, role) fail.
    pub fn fail_load(&mut self, owner: &OwnerKey, role: &CollectionRole, message: &str) {
        self.failures
            .insert((owner.clone(), role.clone()), message.to_string());
    }

    /// How many streaming loads this session has performed.
    pub fn load_count(&self) -> usize {
        self.loads.get()
    }
}

impl SessionContext for MemorySession {
    fn queueing_enabled(&self, _role: &CollectionRole) -> bool {
        self.queueing
    }

    fn probe_membership(
        &self,
        owner: &OwnerKey,
        role: &CollectionRole,
        element: &Value,
    ) -> Presence {
        match self
            .presence
            .get(&(owner.clone(), role.clone()))
            .and_then(|answers| answers.get(element))
        {
            Some(true) => Presence::Present,
            Some(false) => Presence::Absent,
            None => Presence::Unknown,
        }
    }

    fn load_collection(&self, target: &mut CollectionProxy) -> std::result::Result<(), LoadError> {
        self.loads.set(self.loads.get() + 1);
        let key = (target.owner().clone(), target.role().clone());

        if let Some(message) = self.failures.get(&key) {
            return Err(LoadError(message.clone()));
        }

        let rows = self.rows.get(&key).cloned().unwrap_or_default();
        for row in &rows {
            target
                .read_from(row)
                .map_err(|err| LoadError(err.to_string()))?;
        }
        Ok(())
    }
}
