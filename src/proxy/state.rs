use std::fmt;

/// Lifecycle of the live container behind a collection proxy.
///
/// State transitions:
/// ```text
/// Uninitialized ──begin_read──> Initializing ──end_read──> Initialized
/// ```
///
/// A `directly_accessible` proxy is constructed already `Initialized` and
/// never passes through `Initializing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No storage read has happened yet; contents are unknown.
    Uninitialized,

    /// A streaming load is in flight. Any re-entrant access is a contract
    /// violation and fails fast.
    Initializing,

    /// The live container holds the collection contents.
    Initialized,
}

impl LoadState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, LoadState::Initialized)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Initializing)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Uninitialized => write!(f, "UNINITIALIZED"),
            LoadState::Initializing => write!(f, "INITIALIZING"),
            LoadState::Initialized => write!(f, "INITIALIZED"),
        }
    }
}
