//! Host capability trait for reading and mutating host-owned elements

use serde::{Deserialize, Serialize};
use wsmap_core::{Category, EntityId, TargetId};

/// Value stored in a host attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Text(String),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<&TargetId> for AttributeValue {
    fn from(target: &TargetId) -> Self {
        match target {
            TargetId::Id(id) => Self::Integer(*id),
            TargetId::Name(name) => Self::Text(name.clone()),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

/// An attribute as seen through the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub value: AttributeValue,

    #[serde(default)]
    pub read_only: bool,
}

impl Attribute {
    pub fn writable(value: impl Into<AttributeValue>) -> Self {
        Self {
            value: value.into(),
            read_only: false,
        }
    }

    pub fn read_only(value: impl Into<AttributeValue>) -> Self {
        Self {
            value: value.into(),
            read_only: true,
        }
    }
}

/// Errors reported by a host
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Host unavailable: {0}")]
    Unavailable(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Attribute '{key}' not found on entity {entity}")]
    AttributeMissing { entity: EntityId, key: String },

    #[error("Attribute '{key}' is read-only on entity {entity}")]
    ReadOnly { entity: EntityId, key: String },

    #[error("Host rejected the operation: {0}")]
    Rejected(String),

    #[error("No unit of work is open")]
    NoActiveUnit,

    #[error("A unit of work is already open: {0}")]
    UnitAlreadyOpen(String),
}

/// Capabilities the classification engine needs from a host application
///
/// Writes are only valid between `begin` and `commit`/`rollback`. Units of
/// work are never nested; a host returns `UnitAlreadyOpen` if asked to.
pub trait HostContext {
    /// Get the host name (e.g. "Snapshot", "Mock")
    fn name(&self) -> &str;

    /// List elements in the given categories, in host order
    ///
    /// An empty category list means every element.
    fn enumerate(&self, categories: &[Category]) -> Result<Vec<EntityId>, HostError>;

    /// Name used for classification, if the element has one
    fn display_name(&self, entity: EntityId) -> Result<Option<String>, HostError>;

    /// Category of the element, if any
    fn category(&self, entity: EntityId) -> Result<Option<Category>, HostError>;

    /// Read an attribute; `None` if the element has no such attribute
    fn attribute(&self, entity: EntityId, key: &str) -> Result<Option<Attribute>, HostError>;

    /// Write an attribute inside the open unit of work
    fn set_attribute(
        &mut self,
        entity: EntityId,
        key: &str,
        value: AttributeValue,
    ) -> Result<(), HostError>;

    /// Open a unit of work
    fn begin(&mut self, label: &str) -> Result<(), HostError>;

    /// Commit the open unit of work
    fn commit(&mut self) -> Result<(), HostError>;

    /// Discard the open unit of work
    fn rollback(&mut self) -> Result<(), HostError>;
}
