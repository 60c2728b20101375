//! File-backed host over a JSON model export
//!
//! A snapshot is the element list a host exports (ids, categories, names and
//! writable attributes), plus any point-cloud instances. Point clouds share
//! the element id space: they are addressable by id for attribute reads and
//! writes, but `enumerate` only lists `elements`.
//!
//! Writes are staged per unit of work and applied to the in-memory snapshot
//! on commit; `save` writes the result back to disk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use wsmap_core::{Category, EntityId, NameSource};
use crate::adapter::{Attribute, AttributeValue, HostContext, HostError};
use crate::point_cloud::{PointCloud, PointCloudSource};

/// One exported element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotElement {
    pub id: EntityId,

    pub category: Category,

    /// Instance name
    #[serde(default)]
    pub name: Option<String>,

    /// Type name (wall type, floor type, ...)
    #[serde(default)]
    pub type_name: Option<String>,

    #[serde(default)]
    pub attributes: HashMap<String, Attribute>,
}

/// On-disk snapshot document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub elements: Vec<SnapshotElement>,

    #[serde(default)]
    pub point_clouds: Vec<PointCloud>,

    /// Names of the user worksets already in the model
    #[serde(default)]
    pub worksets: Vec<String>,
}

/// Snapshot loading errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse snapshot: {0}")]
    ParseError(String),

    #[error("Duplicate element or point-cloud id {0} in snapshot")]
    DuplicateId(EntityId),
}

/// Where an id lives in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Element(usize),
    PointCloud(usize),
}

/// Host backed by a [`Snapshot`]
#[derive(Debug)]
pub struct SnapshotHost {
    snapshot: Snapshot,
    index: HashMap<EntityId, Slot>,
    name_source: NameSource,
    open_unit: Option<String>,
    staged: Vec<(Slot, String, AttributeValue)>,
    committed_writes: usize,
}

impl SnapshotHost {
    /// Wrap an in-memory snapshot
    pub fn new(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let mut index =
            HashMap::with_capacity(snapshot.elements.len() + snapshot.point_clouds.len());
        let elements = snapshot.elements.iter().enumerate().map(|(i, e)| (e.id, Slot::Element(i)));
        let clouds = snapshot
            .point_clouds
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, Slot::PointCloud(i)));

        for (id, slot) in elements.chain(clouds) {
            if index.insert(id, slot).is_some() {
                return Err(SnapshotError::DuplicateId(id));
            }
        }

        Ok(Self {
            snapshot,
            index,
            name_source: NameSource::default(),
            open_unit: None,
            staged: Vec::new(),
            committed_writes: 0,
        })
    }

    /// Load a snapshot file
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_json(&contents)
    }

    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| SnapshotError::ParseError(e.to_string()))?;

        Self::new(snapshot)
    }

    pub fn with_name_source(mut self, name_source: NameSource) -> Self {
        self.name_source = name_source;
        self
    }

    pub fn set_name_source(&mut self, name_source: NameSource) {
        self.name_source = name_source;
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Number of attribute writes applied by committed units of work
    pub fn committed_writes(&self) -> usize {
        self.committed_writes
    }

    /// Write the snapshot (with committed changes) to disk
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(&self.snapshot)
            .map_err(|e| SnapshotError::ParseError(e.to_string()))?;

        std::fs::write(path, json)
            .map_err(|e| SnapshotError::IoError(path.display().to_string(), e.to_string()))
    }

    fn slot(&self, entity: EntityId) -> Result<Slot, HostError> {
        self.index.get(&entity).copied().ok_or(HostError::EntityNotFound(entity))
    }

    fn attributes(&self, slot: Slot) -> &HashMap<String, Attribute> {
        match slot {
            Slot::Element(i) => &self.snapshot.elements[i].attributes,
            Slot::PointCloud(i) => &self.snapshot.point_clouds[i].attributes,
        }
    }

    fn attributes_mut(&mut self, slot: Slot) -> &mut HashMap<String, Attribute> {
        match slot {
            Slot::Element(i) => &mut self.snapshot.elements[i].attributes,
            Slot::PointCloud(i) => &mut self.snapshot.point_clouds[i].attributes,
        }
    }
}

impl HostContext for SnapshotHost {
    fn name(&self) -> &str {
        "Snapshot"
    }

    fn enumerate(&self, categories: &[Category]) -> Result<Vec<EntityId>, HostError> {
        Ok(self
            .snapshot
            .elements
            .iter()
            .filter(|e| categories.is_empty() || categories.contains(&e.category))
            .map(|e| e.id)
            .collect())
    }

    fn display_name(&self, entity: EntityId) -> Result<Option<String>, HostError> {
        Ok(match self.slot(entity)? {
            Slot::Element(i) => {
                let element = &self.snapshot.elements[i];
                match self.name_source {
                    NameSource::Type => element.type_name.clone(),
                    NameSource::Instance => element.name.clone(),
                }
            }
            Slot::PointCloud(i) => Some(self.snapshot.point_clouds[i].metadata.name.clone()),
        })
    }

    fn category(&self, entity: EntityId) -> Result<Option<Category>, HostError> {
        Ok(match self.slot(entity)? {
            Slot::Element(i) => Some(self.snapshot.elements[i].category.clone()),
            Slot::PointCloud(_) => None,
        })
    }

    fn attribute(&self, entity: EntityId, key: &str) -> Result<Option<Attribute>, HostError> {
        let slot = self.slot(entity)?;
        Ok(self.attributes(slot).get(key).cloned())
    }

    fn set_attribute(
        &mut self,
        entity: EntityId,
        key: &str,
        value: AttributeValue,
    ) -> Result<(), HostError> {
        if self.open_unit.is_none() {
            return Err(HostError::NoActiveUnit);
        }

        let slot = self.slot(entity)?;
        let read_only = match self.attributes(slot).get(key) {
            Some(attr) => attr.read_only,
            None => return Err(HostError::AttributeMissing { entity, key: key.to_string() }),
        };
        if read_only {
            return Err(HostError::ReadOnly { entity, key: key.to_string() });
        }

        self.staged.push((slot, key.to_string(), value));
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

        for (slot, key, value) in std::mem::take(&mut self.staged) {
            if let Some(attr) = self.attributes_mut(slot).get_mut(&key) {
                attr.value = value;
                self.committed_writes += 1;
            }
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), HostError> {
        if self.open_unit.take().is_none() {
            return Err(HostError::NoActiveUnit);
        }
        self.staged.clear();
        Ok(())
    }
}

impl PointCloudSource for SnapshotHost {
    fn point_clouds(&self) -> Result<Vec<PointCloud>, HostError> {
        Ok(self.snapshot.point_clouds.clone())
    }
}
