// ============================================================================
// lazycoll Library
// ============================================================================

//! Lazy-loaded persistent collection proxies with snapshot-based change
//! tracking.
//!
//! A proxy exposes a storage-backed collection through an ordinary container
//! interface while deferring the storage read until first access. At load
//! time it captures a snapshot of the loaded contents; at flush time the
//! owning unit-of-work diffs the live contents against that snapshot to
//! decide exactly what to insert, delete, or cascade. Mutations issued before
//! the load can be queued as delayed operations so whole units of work run
//! without ever touching storage.
//!
//! # Examples
//!
//! ```
//! use lazycoll::{
//!     BasicElementType, CollectionMapping, ContainerShape, DataType, MemorySession,
//!     OwnerKey, SetProxy, Value,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let owner = OwnerKey::new("Order", Value::Integer(1));
//! let mapping = CollectionMapping::new(
//!     "Order.tags",
//!     ContainerShape::Set,
//!     "all-delete-orphan",
//!     Arc::new(BasicElementType::new(DataType::Text)),
//! )?;
//!
//! let mut session = MemorySession::new();
//! session.seed_rows(
//!     &owner,
//!     mapping.role(),
//!     vec![vec![Value::from("red")], vec![Value::from("blue")]],
//! );
//!
//! let mut tags = SetProxy::new(owner, mapping)?;
//!
//! // first access triggers the load
//! assert_eq!(tags.len(&session)?, 2);
//! assert!(tags.base_mut().equals_snapshot()?);
//!
//! // mutate, then let the unit-of-work diff against the snapshot
//! tags.add(Value::from("green"), &session)?;
//! assert!(!tags.base_mut().equals_snapshot()?);
//! assert!(tags.base().needs_inserting(&Value::from("green"))?);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod element;
pub mod mapping;
pub mod proxy;
pub mod session;

// Re-export main types for convenience
pub use core::{CollectionRole, DataType, EntityRef, OwnerKey, ProxyError, Result, Row, Value};
pub use element::{BasicElementType, CacheValue, ElementType, EntityElementType};
pub use mapping::{CascadeStyle, CollectionMapping, ContainerShape};
pub use proxy::{
    CollectionProxy, Container, DelayedOperation, IndexedAccess, ListProxy, LoadState, SetAlgebra,
    SetProxy, Snapshot,
};
pub use session::{LoadError, MemorySession, Presence, SessionContext};
