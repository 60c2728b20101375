//! Per-entity mutation inside a unit of work
//!
//! Each call opens its own unit of work, so a failure only ever discards the
//! write for that one entity.

use wsmap_core::{DiagnosticCode, EntityId, TargetId};
use wsmap_host::{AttributeValue, HostContext, HostError};

/// Why an entity's target attribute was not written
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("Attribute '{0}' does not exist on this entity")]
    AttributeMissing(String),

    #[error("Attribute '{0}' is read-only")]
    ReadOnly(String),

    #[error("Host rejected the write: {0}")]
    HostRejected(String),
}

impl MutationError {
    /// Diagnostic code reported for this failure
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::AttributeMissing(_) => DiagnosticCode::MutationAttributeMissing,
            Self::ReadOnly(_) => DiagnosticCode::MutationReadOnly,
            Self::HostRejected(_) => DiagnosticCode::MutationHostRejected,
        }
    }

    fn from_host(error: HostError, key: &str) -> Self {
        match error {
            HostError::AttributeMissing { .. } => Self::AttributeMissing(key.to_string()),
            HostError::ReadOnly { .. } => Self::ReadOnly(key.to_string()),
            other => Self::HostRejected(other.to_string()),
        }
    }
}

/// Write `target` into the entity's `key` attribute and commit
///
/// Opens a unit of work, checks the attribute, writes, commits. Any failure
/// after the unit is opened rolls it back before returning.
pub fn apply<H>(
    host: &mut H,
    entity: EntityId,
    key: &str,
    target: &TargetId,
) -> Result<(), MutationError>
where
    H: HostContext + ?Sized,
{
    apply_value(host, entity, key, AttributeValue::from(target))
}

/// Same as [`apply`] for an arbitrary attribute value
pub fn apply_value<H>(
    host: &mut H,
    entity: EntityId,
    key: &str,
    value: AttributeValue,
) -> Result<(), MutationError>
where
    H: HostContext + ?Sized,
{
    let label = format!("Assign {} to {}", key, entity);
    host.begin(&label)
        .map_err(|e| MutationError::HostRejected(e.to_string()))?;

    match write(host, entity, key, value.clone()) {
        Ok(()) => {
            tracing::debug!(entity = %entity, key, value = %value, "Attribute written");
            Ok(())
        }
        Err(error) => {
            if let Err(rollback_error) = host.rollback() {
                tracing::warn!(entity = %entity, error = %rollback_error, "Rollback failed");
            }
            tracing::warn!(entity = %entity, key, error = %error, "Mutation failed");
            Err(error)
        }
    }
}

fn write<H>(
    host: &mut H,
    entity: EntityId,
    key: &str,
    value: AttributeValue,
) -> Result<(), MutationError>
where
    H: HostContext + ?Sized,
{
    let attribute = host
        .attribute(entity, key)
        .map_err(|e| MutationError::from_host(e, key))?
        .ok_or_else(|| MutationError::AttributeMissing(key.to_string()))?;

    if attribute.read_only {
        return Err(MutationError::ReadOnly(key.to_string()));
    }

    host.set_attribute(entity, key, value)
        .map_err(|e| MutationError::from_host(e, key))?;

    host.commit()
        .map_err(|e| MutationError::HostRejected(e.to_string()))
}
