//! Test fixtures for end-to-end CLI tests
//!
//! Each test gets a temporary project directory holding a config, a model
//! snapshot and, where needed, a shell script standing in for an external
//! process.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Snapshot whose point cloud appears only in `point_clouds`, and whose
/// first wall has an instance name but no type name
pub const MODEL_SNAPSHOT: &str = r#"{
    "elements": [
        {"id": 1, "category": "Walls", "name": "Basic Wall",
         "attributes": {"workset": {"value": 0}}},
        {"id": 2, "category": "Walls", "name": "Curtain Wall", "type_name": "21_outer",
         "attributes": {"workset": {"value": 0}}}
    ],
    "point_clouds": [
        {"id": 301, "name": "Site scan", "scans": ["north.rcs"], "regions": [],
         "color_supported": true,
         "attributes": {"feature_count": {"value": 0}}}
    ]
}"#;

/// Detector that checks its input and reports one plane and one cluster
pub const DETECTOR_SCRIPT: &str = r#"test -s point_cloud_data.json || exit 9
cat > detected_features.json <<'JSON'
{"detected_features": [
    {"type": "Plane", "equation": [0.0, 0.0, 1.0, -3.0], "num_points": 1000},
    {"type": "Cluster", "num_points": 250}
]}
JSON
"#;

/// Temporary project with a snapshot and a config file
pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    /// Project whose config is `config` (TOML)
    pub fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wsmap.toml"), config).unwrap();
        std::fs::write(dir.path().join("model.json"), MODEL_SNAPSHOT).unwrap();
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.path(name), contents).unwrap();
    }

    pub fn snapshot(&self) -> serde_json::Value {
        read_json(&self.path("model.json"))
    }

    /// Run `wsmap --config <project>/wsmap.toml <args>` from the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_wsmap"))
            .arg("--config")
            .arg(self.path("wsmap.toml"))
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .unwrap()
    }
}

/// Run `wsmap model-service` with `input` on stdin
pub fn run_model_service(input: &str) -> Output {
    use std::io::Write;

    let mut child = Command::new(env!("CARGO_BIN_EXE_wsmap"))
        .arg("model-service")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
