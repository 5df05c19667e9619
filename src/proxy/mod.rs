// ============================================================================
// Collection Proxy Module
// ============================================================================
//
// The state machine behind lazy collection loading:
// - LoadState: Uninitialized -> Initializing -> Initialized
// - DelayedOperation: mutations deferred while unloaded (Command Pattern)
// - Snapshot: the load-time copy that dirty checking diffs against
// - CollectionProxy: shared machinery; SetProxy/ListProxy: concrete shapes
//
// ============================================================================

pub mod base;
pub mod container;
pub mod list;
pub mod operation;
pub mod set;
pub mod snapshot;
pub mod state;

pub use base::CollectionProxy;
pub use container::Container;
pub use list::ListProxy;
pub use operation::DelayedOperation;
pub use set::SetProxy;
pub use snapshot::Snapshot;
pub use state::LoadState;

use crate::core::{Result, Value};
use crate::session::SessionContext;
use std::collections::HashSet;

/// Capability of set-shaped proxies: algebra over the live contents.
pub trait SetAlgebra {
    fn union_with(
        &mut self,
        other: &HashSet<Value>,
        session: &dyn SessionContext,
    ) -> Result<HashSet<Value>>;

    fn intersection_with(
        &mut self,
        other: &HashSet<Value>,
        session: &dyn SessionContext,
    ) -> Result<HashSet<Value>>;
}

/// Capability of indexed (list-shaped) proxies: positional access.
pub trait IndexedAccess {
    fn element_at(&mut self, index: usize, session: &dyn SessionContext) -> Result<Value>;

    fn set_element_at(
        &mut self,
        index: usize,
        element: Value,
        session: &dyn SessionContext,
    ) -> Result<Value>;
}
