// ============================================================================
// Collection Mapping
// ============================================================================
//
// Everything the proxy needs to know about a mapped collection, resolved and
// validated once at mapping-load time: the role, the container shape, the
// cascade style and the element-type collaborator. Invalid mappings fail
// here, never during a runtime mutation.
//
// ============================================================================

use crate::core::{CollectionRole, ProxyError, Result};
use crate::element::ElementType;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Shape of the live container behind a collection role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerShape {
    Set,
    List,
    Map,
}

impl fmt::Display for ContainerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "set"),
            Self::List => write!(f, "list"),
            Self::Map => write!(f, "map"),
        }
    }
}

/// A single cascade style token, parsed eagerly from the mapping document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeStyle {
    None,
    SaveUpdate,
    Delete,
    DeleteOrphan,
    All,
    AllDeleteOrphan,
}

impl CascadeStyle {
    /// Whether this style asks for orphaned elements to be deleted.
    pub fn deletes_orphans(&self) -> bool {
        matches!(self, Self::DeleteOrphan | Self::AllDeleteOrphan)
    }
}

impl FromStr for CascadeStyle {
    type Err = ProxyError;

    fn from_str(token: &str) -> Result<Self> {
        match token.trim() {
            "none" => Ok(Self::None),
            "save-update" => Ok(Self::SaveUpdate),
            "delete" => Ok(Self::Delete),
            "delete-orphan" => Ok(Self::DeleteOrphan),
            "all" => Ok(Self::All),
            "all-delete-orphan" => Ok(Self::AllDeleteOrphan),
            other => Err(ProxyError::CascadeConfiguration(format!(
                "unrecognized cascade style '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CascadeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::None => "none",
            Self::SaveUpdate => "save-update",
            Self::Delete => "delete",
            Self::DeleteOrphan => "delete-orphan",
            Self::All => "all",
            Self::AllDeleteOrphan => "all-delete-orphan",
        };
        write!(f, "{}", token)
    }
}

/// Parse a comma-separated cascade attribute into its styles.
pub fn parse_cascade(attribute: &str) -> Result<Vec<CascadeStyle>> {
    attribute
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .map(CascadeStyle::from_str)
        .collect()
}

/// Resolved mapping for one collection role.
#[derive(Debug, Clone)]
pub struct CollectionMapping {
    role: CollectionRole,
    shape: ContainerShape,
    cascade: Vec<CascadeStyle>,
    element_type: Arc<dyn ElementType>,
}

impl CollectionMapping {
    /// Build a mapping, validating shape and cascade attribute eagerly.
    pub fn new(
        role: impl Into<CollectionRole>,
        shape: ContainerShape,
        cascade: &str,
        element_type: Arc<dyn ElementType>,
    ) -> Result<Self> {
        if shape == ContainerShape::Map {
            return Err(ProxyError::UnsupportedOperation(
                "map-shaped collections are not supported by this proxy".into(),
            ));
        }

        Ok(Self {
            role: role.into(),
            shape,
            cascade: parse_cascade(cascade)?,
            element_type,
        })
    }

    pub fn role(&self) -> &CollectionRole {
        &self.role
    }

    pub fn shape(&self) -> ContainerShape {
        self.shape
    }

    pub fn cascade(&self) -> &[CascadeStyle] {
        &self.cascade
    }

    pub fn element_type(&self) -> &dyn ElementType {
        self.element_type.as_ref()
    }

    pub fn delete_orphan_enabled(&self) -> bool {
        self.cascade.iter().any(CascadeStyle::deletes_orphans)
    }
}
