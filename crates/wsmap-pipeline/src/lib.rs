//! External processes around the classification engine
//!
//! - [`feature_detection`] - point-cloud export, the external detector run,
//!   and import of its `detected_features` file
//! - [`model_service`] - the stdin/stdout model-query service and its client
//! - [`process`] - bounded subprocess execution shared by both

pub mod process;
pub mod feature_detection;
pub mod model_service;

pub use process::{run_process, ProcessError, ProcessOutput, ProcessSpec};
pub use feature_detection::{
    export_point_clouds, BoundingBox, DetectedFeature, FeatureKind, FeaturePipeline, FeatureReport,
    PipelineError, PipelineRun,
};
pub use model_service::{
    extract_model_data, load_or_extract, query_model, respond, ModelElement, ModelQuery,
    ModelServiceError,
};
