//! Test fixtures for host integration tests
//!
//! Snapshot documents shaped like a small model export: a handful of walls
//! with workset attributes, one floor, and a georeferenced point cloud.

#![allow(dead_code)]

/// Snapshot with walls, a floor and one point cloud
pub const MODEL_SNAPSHOT: &str = r#"{
    "elements": [
        {"id": 101, "category": "Walls", "name": "Basic Wall", "type_name": "16_foundation",
         "attributes": {"workset": {"value": 0}}},
        {"id": 102, "category": "Walls", "name": "Basic Wall", "type_name": "21_outer",
         "attributes": {"workset": {"value": 0}}},
        {"id": 103, "category": "Walls", "name": "Curtain Wall", "type_name": "L4-H_glass",
         "attributes": {"workset": {"value": 0, "read_only": true}}},
        {"id": 104, "category": "Walls", "name": "Generic",
         "attributes": {}},
        {"id": 201, "category": "Floors", "name": "Floor 1", "type_name": "23_floor",
         "attributes": {"workset": {"value": "Floors"}}}
    ],
    "point_clouds": [
        {"id": 301, "name": "Site scan", "scans": ["north.rcs", "south.rcs"], "regions": ["roof"],
         "color_supported": true,
         "transform": {"origin": [100.0, 200.0, 0.0], "basis_x": [0.0, 1.0, 0.0],
                       "basis_y": [-1.0, 0.0, 0.0], "basis_z": [0.0, 0.0, 1.0]}}
    ],
    "worksets": ["Shared Levels and Grids", "Fundering"]
}"#;

/// Element ids of every wall in [`MODEL_SNAPSHOT`], in file order
pub fn wall_ids() -> Vec<i64> {
    vec![101, 102, 103, 104]
}
