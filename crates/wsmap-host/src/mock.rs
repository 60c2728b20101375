//! Mock host for testing
//!
//! Holds elements in memory and never talks to a real host application.
//! It's useful for:
//! - Unit testing classification and mutation logic
//! - Simulating host failures (enumeration, individual writes, every n-th write)
//! - Counting writes, commits and rollbacks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wsmap_host::{Attribute, MockEntity, MockHost};
//!
//! let mut host = MockHost::new()
//!     .with_entity(
//!         MockEntity::new(1, "Walls", "21_outer")
//!             .with_attribute("workset", Attribute::writable(0)),
//!     )
//!     .with_failure_every(3);
//! ```

use std::collections::HashMap;
use wsmap_core::{Category, EntityId};
use crate::adapter::{Attribute, AttributeValue, HostContext, HostError};
use crate::point_cloud::{PointCloud, PointCloudSource};

/// An element stored in the mock host
#[derive(Debug, Clone, PartialEq)]
pub struct MockEntity {
    pub id: EntityId,
    pub category: Category,
    pub name: Option<String>,
    pub attributes: HashMap<String, Attribute>,
}

impl MockEntity {
    pub fn new(id: i64, category: &str, name: &str) -> Self {
        Self {
            id: EntityId(id),
            category: Category::new(category),
            name: Some(name.to_string()),
            attributes: HashMap::new(),
        }
    }

    /// Element without a readable name
    pub fn unnamed(id: i64, category: &str) -> Self {
        Self {
            id: EntityId(id),
            category: Category::new(category),
            name: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, attribute: Attribute) -> Self {
        self.attributes.insert(key.to_string(), attribute);
        self
    }
}

/// In-memory host with fault injection
#[derive(Debug, Default)]
pub struct MockHost {
    entities: Vec<MockEntity>,
    point_clouds: Vec<PointCloud>,

    /// Errors returned by `set_attribute` for specific elements
    errors: HashMap<EntityId, HostError>,

    /// Errors returned by `display_name` for specific elements
    name_errors: HashMap<EntityId, HostError>,

    /// Reject every n-th `set_attribute` call
    fail_every: Option<usize>,

    /// Simulate an unavailable host
    fail_enumeration: bool,

    open_unit: Option<String>,
    staged: Vec<(EntityId, String, AttributeValue)>,

    set_calls: usize,
    commits: usize,
    rollbacks: usize,
}

impl MockHost {
    /// Create an empty mock host
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: MockEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_point_cloud(mut self, cloud: PointCloud) -> Self {
        self.point_clouds.push(cloud);
        self
    }

    /// Reject writes to one element with the given error
    pub fn with_error_for(mut self, entity: EntityId, error: HostError) -> Self {
        self.errors.insert(entity, error);
        self
    }

    /// Make `display_name` fail for one element
    pub fn with_name_error_for(mut self, entity: EntityId, error: HostError) -> Self {
        self.name_errors.insert(entity, error);
        self
    }

    /// Reject every n-th call to `set_attribute` (1-based)
    pub fn with_failure_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    /// Fail all enumeration requests
    pub fn with_enumeration_failure(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn add_entity(&mut self, entity: MockEntity) {
        self.entities.push(entity);
    }

    /// Number of `set_attribute` calls, successful or not
    pub fn set_calls(&self) -> usize {
        self.set_calls
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    /// Whether a unit of work is currently open
    pub fn in_unit(&self) -> bool {
        self.open_unit.is_some()
    }

    /// Committed value of an attribute
    pub fn value(&self, entity: EntityId, key: &str) -> Option<&AttributeValue> {
        self.find(entity)
            .and_then(|e| e.attributes.get(key))
            .map(|a| &a.value)
    }

    fn find(&self, entity: EntityId) -> Option<&MockEntity> {
        self.entities.iter().find(|e| e.id == entity)
    }

    fn find_mut(&mut self, entity: EntityId) -> Option<&mut MockEntity> {
        self.entities.iter_mut().find(|e| e.id == entity)
    }
}

impl HostContext for MockHost {
    fn name(&self) -> &str {
        "Mock"
    }

    fn enumerate(&self, categories: &[Category]) -> Result<Vec<EntityId>, HostError> {
        if self.fail_enumeration {
            return Err(HostError::Unavailable("Simulated host failure".to_string()));
        }

        Ok(self
            .entities
            .iter()
            .filter(|e| categories.is_empty() || categories.contains(&e.category))
            .map(|e| e.id)
            .collect())
    }

    fn display_name(&self, entity: EntityId) -> Result<Option<String>, HostError> {
        if let Some(error) = self.name_errors.get(&entity) {
            return Err(error.clone());
        }

        self.find(entity)
            .map(|e| e.name.clone())
            .ok_or(HostError::EntityNotFound(entity))
    }

    fn category(&self, entity: EntityId) -> Result<Option<Category>, HostError> {
        self.find(entity)
            .map(|e| Some(e.category.clone()))
            .ok_or(HostError::EntityNotFound(entity))
    }

    fn attribute(&self, entity: EntityId, key: &str) -> Result<Option<Attribute>, HostError> {
        self.find(entity)
            .map(|e| e.attributes.get(key).cloned())
            .ok_or(HostError::EntityNotFound(entity))
    }

    fn set_attribute(
        &mut self,
        entity: EntityId,
        key: &str,
        value: AttributeValue,
    ) -> Result<(), HostError> {
        self.set_calls += 1;

        if self.open_unit.is_none() {
            return Err(HostError::NoActiveUnit);
        }

        if let Some(n) = self.fail_every {
            if n > 0 && self.set_calls % n == 0 {
                return Err(HostError::Rejected(format!(
                    "Simulated failure on write #{}",
                    self.set_calls
                )));
            }
        }

        if let Some(error) = self.errors.get(&entity) {
            return Err(error.clone());
        }

        let target = self.find(entity).ok_or(HostError::EntityNotFound(entity))?;
        match target.attributes.get(key) {
            None => {
                return Err(HostError::AttributeMissing { entity, key: key.to_string() });
            }
            Some(attr) if attr.read_only => {
                return Err(HostError::ReadOnly { entity, key: key.to_string() });
            }
            Some(_) => {}
        }

        self.staged.push((entity, key.to_string(), value));
        Ok(())
    }

    fn begin(&mut self, label: &str) -> Result<(), HostError> {
        if let Some(open) = &self.open_unit {
            return Err(HostError::UnitAlreadyOpen(open.clone()));
        }
        self.open_unit = Some(label.to_string());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HostError> {
        if self.open_unit.take().is_none() {
            return Err(HostError::NoActiveUnit);
        }

        for (entity, key, value) in std::mem::take(&mut self.staged) {
            if let Some(attr) = self.find_mut(entity).and_then(|e| e.attributes.get_mut(&key)) {
                attr.value = value;
            }
        }

        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), HostError> {
        if self.open_unit.take().is_none() {
            return Err(HostError::NoActiveUnit);
        }

        self.staged.clear();
        self.rollbacks += 1;
        Ok(())
    }
}

impl PointCloudSource for MockHost {
    fn point_clouds(&self) -> Result<Vec<PointCloud>, HostError> {
        if self.fail_enumeration {
            return Err(HostError::Unavailable("Simulated host failure".to_string()));
        }
        Ok(self.point_clouds.clone())
    }
}
