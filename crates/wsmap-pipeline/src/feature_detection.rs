//! Point-cloud feature detection through an external process
//!
//! A run has four steps:
//! 1. Export point-cloud metadata to the configured input file
//! 2. Remove any output file left over from a previous run
//! 3. Run the detector with a bounded wait
//! 4. Read `detected_features` from the output file
//!
//! A run succeeds only when the detector exits with status 0 and leaves a
//! well-formed output file. Any other result is a single [`PipelineError`];
//! nothing is retried and no host element is touched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wsmap_core::{BatchOutcome, PipelineConfig};
use wsmap_engine::apply_value;
use wsmap_host::{
    AttributeValue, HostContext, HostError, PointCloud, PointCloudMetadata, PointCloudSource,
};
use crate::process::{run_process, ProcessError, ProcessSpec};

/// Kind of feature reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Cluster,
    Plane,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cluster => write!(f, "Cluster"),
            Self::Plane => write!(f, "Plane"),
        }
    }
}

/// Axis-aligned box around a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

/// One detected feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFeature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    pub num_points: u64,

    /// Plane coefficients `[a, b, c, d]` of `ax + by + cz + d = 0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<[f64; 4]>,

    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DetectedFeature {
    /// One-line human description
    pub fn describe(&self) -> String {
        match (&self.kind, &self.equation) {
            (FeatureKind::Plane, Some([a, b, c, d])) => format!(
                "Plane: {}x + {}y + {}z + {} = 0 with {} points",
                a, b, c, d, self.num_points
            ),
            (kind, _) => match &self.bounding_box {
                Some(bb) => format!(
                    "{} with {} points in [{:?} .. {:?}]",
                    kind, self.num_points, bb.min, bb.max
                ),
                None => format!("{} with {} points", kind, self.num_points),
            },
        }
    }
}

/// Contents of the detector's output file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureReport {
    #[serde(default)]
    pub detected_features: Vec<DetectedFeature>,
}

impl FeatureReport {
    pub fn count(&self, kind: FeatureKind) -> usize {
        self.detected_features.iter().filter(|f| f.kind == kind).count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No point clouds found; nothing to export")]
    NoPointClouds,

    #[error("Failed to read point clouds from host: {0}")]
    Host(#[from] HostError),

    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Feature detection exited with {}: {stderr}", exit_label(.exit_code))]
    NonZeroExit { exit_code: Option<i32>, stderr: String },

    #[error("Feature detection produced no output file at {0}")]
    OutputMissing(PathBuf),

    #[error("Malformed feature output in {path}: {message}")]
    MalformedOutput { path: PathBuf, message: String },
}

fn exit_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    /// Point clouds that were exported
    pub point_clouds: Vec<PointCloud>,

    pub report: FeatureReport,

    /// Detector stdout, kept for logging
    pub stdout: String,
}

/// Write point-cloud metadata as a JSON array to `path`
pub fn export_point_clouds(point_clouds: &[PointCloud], path: &Path) -> Result<(), PipelineError> {
    let metadata: Vec<&PointCloudMetadata> = point_clouds.iter().map(|c| &c.metadata).collect();
    let json = serde_json::to_string_pretty(&metadata).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    std::fs::write(path, json).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// The configured feature-detection pipeline
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Export, run the detector, and read its output
    pub async fn run<S>(&self, source: &S) -> Result<PipelineRun, PipelineError>
    where
        S: PointCloudSource + ?Sized,
    {
        let point_clouds = source.point_clouds()?;
        if point_clouds.is_empty() {
            return Err(PipelineError::NoPointClouds);
        }

        let input = self.config.input_path();
        export_point_clouds(&point_clouds, &input)?;
        tracing::info!(
            count = point_clouds.len(),
            path = %input.display(),
            "Exported point-cloud metadata"
        );

        let output_path = self.config.output_path();
        remove_stale(&output_path)?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let spec = ProcessSpec::new(&self.config.program, timeout)
            .with_args(self.config.args.iter().cloned())
            .with_working_dir(&self.config.working_dir);
        let output = run_process(&spec).await?;

        if !output.stdout.trim().is_empty() {
            tracing::info!(stdout = %output.stdout.trim(), "Feature detection output");
        }
        if !output.stderr.trim().is_empty() {
            tracing::warn!(stderr = %output.stderr.trim(), "Feature detection stderr");
        }

        if !output.success() {
            return Err(PipelineError::NonZeroExit {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let report = read_report(&output_path)?;
        tracing::info!(
            features = report.detected_features.len(),
            planes = report.count(FeatureKind::Plane),
            clusters = report.count(FeatureKind::Cluster),
            "Feature detection finished"
        );

        Ok(PipelineRun {
            point_clouds,
            report,
            stdout: output.stdout,
        })
    }

    /// Run, then write the detected feature count into `key` on every
    /// exported point cloud
    ///
    /// Nothing is written unless the run succeeds.
    pub async fn run_and_annotate<H>(
        &self,
        host: &mut H,
        key: &str,
    ) -> Result<(PipelineRun, BatchOutcome), PipelineError>
    where
        H: HostContext + PointCloudSource + ?Sized,
    {
        let run = self.run(&*host).await?;
        let count = run.report.detected_features.len() as i64;

        let mut outcome = BatchOutcome::new();
        for cloud in &run.point_clouds {
            outcome.record_classified();
            match apply_value(host, cloud.id, key, AttributeValue::Integer(count)) {
                Ok(()) => outcome.record_success(),
                Err(e) => outcome.record_failure(cloud.id, e.to_string()),
            }
        }

        Ok((run, outcome))
    }
}

fn remove_stale(path: &Path) -> Result<(), PipelineError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale feature output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

fn read_report(path: &Path) -> Result<FeatureReport, PipelineError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::OutputMissing(path.to_path_buf()));
        }
        Err(e) => {
            return Err(PipelineError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    serde_json::from_str(&contents).map_err(|e| PipelineError::MalformedOutput {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_features_and_keeps_extra_fields() {
        let json = r#"{"detected_features": [
            {"type": "Plane", "equation": [1.0, -2.0, 3.0, 4.0], "num_points": 1000},
            {"type": "Cluster", "bounding_box": {"min": [0, 0, 0], "max": [1, 2, 3]},
             "num_points": 42, "label": "column"}
        ]}"#;

        let report: FeatureReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.count(FeatureKind::Plane), 1);
        assert_eq!(report.count(FeatureKind::Cluster), 1);

        let cluster = &report.detected_features[1];
        assert_eq!(cluster.bounding_box.as_ref().unwrap().max, [1.0, 2.0, 3.0]);
        assert_eq!(cluster.extra.get("label"), Some(&serde_json::json!("column")));

        let round_trip = serde_json::to_value(cluster).unwrap();
        assert_eq!(round_trip["label"], "column");
    }

    #[test]
    fn unknown_feature_type_is_malformed() {
        let json = r#"{"detected_features": [{"type": "Sphere", "num_points": 1}]}"#;
        assert!(serde_json::from_str::<FeatureReport>(json).is_err());
    }

    #[test]
    fn describes_plane() {
        let json = r#"{"type": "Plane", "equation": [1.0, -2.0, 3.0, 4.0], "num_points": 1000}"#;
        let feature: DetectedFeature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.describe(), "Plane: 1x + -2y + 3z + 4 = 0 with 1000 points");
    }

    #[test]
    fn missing_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detected_features.json");
        assert!(matches!(read_report(&path), Err(PipelineError::OutputMissing(_))));
    }

    #[test]
    fn stale_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detected_features.json");
        std::fs::write(&path, "{}").unwrap();

        remove_stale(&path).unwrap();
        assert!(!path.exists());
        remove_stale(&path).unwrap();
    }

    #[test]
    fn export_writes_metadata_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("point_cloud_data.json");
        let json = r#"{"id": 7, "name": "Scan A", "scans": ["s1"], "regions": ["r1"],
                       "color_supported": true}"#;
        let cloud: PointCloud = serde_json::from_str(json).unwrap();

        export_point_clouds(&[cloud], &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["name"], "Scan A");
        assert_eq!(written[0]["color_supported"], true);
        assert!(written[0].get("id").is_none());
    }
}
