// ============================================================================
// Delayed Operations
// ============================================================================
//
// Implements the Command Pattern for mutations deferred while a collection
// is still unloaded. Each operation is recorded in FIFO order and replayed
// exactly once against the live container when initialization completes.
//
// ============================================================================

use super::container::Container;
use crate::core::Value;

/// One deferred mutation awaiting replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelayedOperation {
    /// Replay clears the live container.
    Clear,

    /// Replay inserts the value.
    Add(Value),

    /// Replay removes the value.
    Remove(Value),
}

impl DelayedOperation {
    /// The value this operation adds, if any.
    ///
    /// The owning entity's cascade logic inspects this without replaying.
    pub fn added_instance(&self) -> Option<&Value> {
        match self {
            DelayedOperation::Add(value) => Some(value),
            _ => None,
        }
    }

    /// The value this operation removes, if any; a candidate orphan.
    pub fn orphan(&self) -> Option<&Value> {
        match self {
            DelayedOperation::Remove(value) => Some(value),
            _ => None,
        }
    }

    /// Apply this operation to the live container.
    ///
    /// Returns whether the container actually changed.
    pub fn replay(self, container: &mut Container) -> bool {
        match self {
            DelayedOperation::Clear => container.clear(),
            DelayedOperation::Add(value) => container.insert(value),
            DelayedOperation::Remove(value) => container.remove(&value),
        }
    }
}
