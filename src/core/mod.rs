pub mod error;
pub mod types;
pub mod value;

pub use error::{ProxyError, Result};
pub use types::{CollectionRole, OwnerKey, Row};
pub use value::{DataType, EntityRef, Value};
