//! Test fixtures for pipeline integration tests
//!
//! The external detector is stood in for by small `sh` scripts run in a
//! temporary working directory.

#![allow(dead_code)]

use std::path::Path;
use wsmap_core::{ModelServiceConfig, PipelineConfig};
use wsmap_host::{Attribute, MockEntity, MockHost, PointCloud, PointCloudMetadata};

pub const FEATURE_KEY: &str = "feature_count";

/// Output of a detector that found one plane and one cluster
pub const TWO_FEATURES: &str = r#"{"detected_features": [
    {"type": "Plane", "equation": [1.0, -2.0, 3.0, 4.0], "num_points": 1000},
    {"type": "Cluster", "bounding_box": {"min": [0, 0, 0], "max": [2, 2, 3]}, "num_points": 250}
]}"#;

/// Snapshot export whose point clouds are listed only under `point_clouds`
pub const CLOUD_SNAPSHOT: &str = r#"{
    "elements": [
        {"id": 1, "category": "Walls", "name": "Basic Wall"},
        {"id": 2, "category": "Walls", "name": "Curtain Wall", "type_name": "21_outer"}
    ],
    "point_clouds": [
        {"id": 301, "name": "Site scan", "scans": ["north.rcs"], "color_supported": true,
         "attributes": {"feature_count": {"value": 0}}}
    ]
}"#;

/// Pipeline running `script` with `sh -c` inside `dir`
pub fn sh_pipeline(dir: &Path, script: &str, timeout_secs: u64) -> PipelineConfig {
    PipelineConfig {
        program: "sh".into(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: dir.to_path_buf(),
        timeout_secs,
        ..PipelineConfig::default()
    }
}

/// Script that checks its input exists and writes `output` as the result
pub fn detector_writing(output: &str) -> String {
    format!(
        "test -s point_cloud_data.json || exit 9\ncat > detected_features.json <<'JSON'\n{}\nJSON",
        output
    )
}

/// Model service running `script` with `sh -c`
pub fn sh_service(script: &str) -> ModelServiceConfig {
    ModelServiceConfig {
        program: "sh".into(),
        args: vec!["-c".to_string(), script.to_string()],
        timeout_secs: 10,
        ..ModelServiceConfig::default()
    }
}

fn cloud(id: i64, name: &str) -> PointCloud {
    PointCloud::new(
        wsmap_core::EntityId(id),
        PointCloudMetadata {
            name: name.to_string(),
            scans: vec![format!("{}.rcs", name)],
            regions: Vec::new(),
            color_supported: true,
            transform: None,
        },
    )
}

/// Host with two point clouds, each with a writable feature-count attribute
pub fn host_with_clouds() -> MockHost {
    MockHost::new()
        .with_entity(
            MockEntity::new(10, "PointClouds", "North")
                .with_attribute(FEATURE_KEY, Attribute::writable(0)),
        )
        .with_entity(
            MockEntity::new(11, "PointClouds", "South")
                .with_attribute(FEATURE_KEY, Attribute::writable(0)),
        )
        .with_point_cloud(cloud(10, "North"))
        .with_point_cloud(cloud(11, "South"))
}
