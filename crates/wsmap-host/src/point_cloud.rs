//! Point-cloud metadata exported to the feature-detection process

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wsmap_core::EntityId;
use crate::adapter::{Attribute, HostError};

/// Total transform of a point-cloud instance
///
/// Stored in origin/basis form as exported by the host; `to_matrix` gives
/// the equivalent 4x4 row-major matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub origin: [f64; 3],
    pub basis_x: [f64; 3],
    pub basis_y: [f64; 3],
    pub basis_z: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            origin: [0.0, 0.0, 0.0],
            basis_x: [1.0, 0.0, 0.0],
            basis_y: [0.0, 1.0, 0.0],
            basis_z: [0.0, 0.0, 1.0],
            scale: 1.0,
        }
    }

    /// Row-major 4x4 matrix; basis vectors are columns, scaled by `scale`
    pub fn to_matrix(&self) -> [[f64; 4]; 4] {
        let s = self.scale;
        let (x, y, z, o) = (self.basis_x, self.basis_y, self.basis_z, self.origin);
        [
            [x[0] * s, y[0] * s, z[0] * s, o[0]],
            [x[1] * s, y[1] * s, z[1] * s, o[1]],
            [x[2] * s, y[2] * s, z[2] * s, o[2]],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

/// One exported point-cloud record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudMetadata {
    pub name: String,

    #[serde(default)]
    pub scans: Vec<String>,

    #[serde(default)]
    pub regions: Vec<String>,

    #[serde(default)]
    pub color_supported: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

/// A point-cloud element and its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub id: EntityId,

    #[serde(flatten)]
    pub metadata: PointCloudMetadata,

    /// Writable attributes on the instance; never exported
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Attribute>,
}

impl PointCloud {
    pub fn new(id: EntityId, metadata: PointCloudMetadata) -> Self {
        Self {
            id,
            metadata,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(key.into(), attribute);
        self
    }
}

/// Hosts that can list point-cloud instances
pub trait PointCloudSource {
    fn point_clouds(&self) -> Result<Vec<PointCloud>, HostError>;
}
