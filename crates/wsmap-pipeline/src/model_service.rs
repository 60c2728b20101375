//! Model-query service
//!
//! The service reads one JSON request from stdin and prints one line:
//!
//! ```text
//! {"question": "How many walls?", "model_data": [...]}
//! -> Received question: How many walls?. Number of model elements: 12.
//! ```
//!
//! The client side extracts `{Id, Category, Name}` records from a host,
//! caches them on disk, and sends them with each question.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wsmap_core::ModelServiceConfig;
use wsmap_host::{HostContext, HostError};
use crate::process::{run_process, ProcessError, ProcessSpec};

/// Request accepted by the service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelQuery {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub model_data: Vec<serde_json::Value>,
}

/// One model element as sent to the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelElement {
    pub id: i64,
    pub category: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Model service failed: {0}")]
    ServiceFailed(String),

    #[error("Failed to read model data from host: {0}")]
    Host(#[from] HostError),

    #[error("Model data cache {path}: {message}")]
    Cache { path: PathBuf, message: String },
}

/// Answer one raw request
pub fn respond(input: &str) -> Result<String, ModelServiceError> {
    let query: ModelQuery =
        serde_json::from_str(input).map_err(|e| ModelServiceError::InvalidRequest(e.to_string()))?;

    Ok(format!(
        "Received question: {}. Number of model elements: {}.",
        query.question,
        query.model_data.len()
    ))
}

/// Send a question to the configured service and return its trimmed reply
pub async fn query_model(
    config: &ModelServiceConfig,
    query: &ModelQuery,
) -> Result<String, ModelServiceError> {
    let request = serde_json::to_string(query)
        .map_err(|e| ModelServiceError::InvalidRequest(e.to_string()))?;

    let spec = ProcessSpec::new(&config.program, Duration::from_secs(config.timeout_secs))
        .with_args(config.args.iter().cloned())
        .with_stdin(request);
    let output = run_process(&spec).await?;

    if !output.success() {
        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim()
        } else {
            output.stderr.trim()
        };
        return Err(ModelServiceError::ServiceFailed(detail.to_string()));
    }

    Ok(output.stdout.trim().to_string())
}

/// Read `{Id, Category, Name}` for every element the host knows
pub fn extract_model_data<H>(host: &H) -> Result<Vec<ModelElement>, ModelServiceError>
where
    H: HostContext + ?Sized,
{
    let mut elements = Vec::new();
    for id in host.enumerate(&[])? {
        let category = host
            .category(id)?
            .map(|c| c.0)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "N/A".to_string());
        let name = host
            .display_name(id)?
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unnamed Element".to_string());

        elements.push(ModelElement { id: id.0, category, name });
    }

    tracing::debug!(count = elements.len(), "Extracted model data");
    Ok(elements)
}

/// Load cached model data, or extract it from the host and write the cache
pub fn load_or_extract<H>(cache: &Path, host: &H) -> Result<Vec<ModelElement>, ModelServiceError>
where
    H: HostContext + ?Sized,
{
    let cache_error = |message: String| ModelServiceError::Cache {
        path: cache.to_path_buf(),
        message,
    };

    if cache.exists() {
        let contents = std::fs::read_to_string(cache).map_err(|e| cache_error(e.to_string()))?;
        let elements: Vec<ModelElement> =
            serde_json::from_str(&contents).map_err(|e| cache_error(e.to_string()))?;
        tracing::debug!(
            path = %cache.display(),
            count = elements.len(),
            "Loaded cached model data"
        );
        return Ok(elements);
    }

    let elements = extract_model_data(host)?;
    let json = serde_json::to_string_pretty(&elements).map_err(|e| cache_error(e.to_string()))?;
    std::fs::write(cache, json).map_err(|e| cache_error(e.to_string()))?;
    tracing::info!(path = %cache.display(), count = elements.len(), "Cached model data");

    Ok(elements)
}

impl ModelQuery {
    /// Build a query carrying the given model elements
    pub fn new(
        question: impl Into<String>,
        elements: &[ModelElement],
    ) -> Result<Self, ModelServiceError> {
        let model_data = elements
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ModelServiceError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            question: question.into(),
            model_data,
        })
    }
}
