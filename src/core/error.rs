use crate::core::types::{CollectionRole, OwnerKey};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("failed to load collection '{role}' of {owner}: {cause}")]
    LoadFailure {
        owner: OwnerKey,
        role: CollectionRole,
        cause: String,
    },

    #[error("re-entrant access to collection '{role}' of {owner} while it is being loaded")]
    ReentrantInitialization {
        owner: OwnerKey,
        role: CollectionRole,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Cascade configuration error: {0}")]
    CascadeConfiguration(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Cache format error: {0}")]
    CacheFormat(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::CacheFormat(err.to_string())
    }
}
