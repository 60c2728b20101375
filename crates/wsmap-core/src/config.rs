//! Configuration schema (wsmap.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::diagnostic::{DiagnosticCode, Severity};
use crate::rule::{Category, RuleTable};

/// Which host name is matched against rule prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
    /// The element's type name (wall type, floor type, ...)
    #[default]
    Type,

    /// The element's own name
    Instance,
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// A named rule table and the elements it applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name (used on the command line)
    pub name: String,

    /// Host categories to enumerate
    pub categories: Vec<Category>,

    /// Name matched against prefixes
    #[serde(default)]
    pub name_source: NameSource,

    /// Ordered rules, first match wins
    pub rules: RuleTable,
}

impl Profile {
    /// Built-in wall workset profile
    pub fn default_walls() -> Self {
        Self {
            name: "walls".to_string(),
            categories: vec![Category::new("Walls")],
            name_source: NameSource::Type,
            rules: RuleTable::default_walls(),
        }
    }
}

/// External feature-detection process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Executable to launch
    pub program: PathBuf,

    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory; input/output files are resolved against it
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Point-cloud metadata written before the run
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Detected features read after the run
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Upper bound on the run; the process is killed when exceeded
    #[serde(default = "default_pipeline_timeout")]
    pub timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python"),
            args: vec!["analyze_point_cloud.py".to_string()],
            working_dir: default_working_dir(),
            input_file: default_input_file(),
            output_file: default_output_file(),
            timeout_secs: default_pipeline_timeout(),
        }
    }
}

impl PipelineConfig {
    /// Absolute-or-relative path of the metadata file
    pub fn input_path(&self) -> PathBuf {
        self.working_dir.join(&self.input_file)
    }

    /// Absolute-or-relative path of the features file
    pub fn output_path(&self) -> PathBuf {
        self.working_dir.join(&self.output_file)
    }
}

/// External model-query service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelServiceConfig {
    /// Executable to launch
    pub program: PathBuf,

    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,

    /// Cached model data (reused when present)
    #[serde(default = "default_model_cache")]
    pub cache_file: PathBuf,

    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelServiceConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("wsmap"),
            args: vec!["model-service".to_string()],
            cache_file: default_model_cache(),
            timeout_secs: default_service_timeout(),
        }
    }
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_input_file() -> PathBuf {
    PathBuf::from("point_cloud_data.json")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("detected_features.json")
}

fn default_pipeline_timeout() -> u64 {
    300
}

fn default_model_cache() -> PathBuf {
    PathBuf::from("model_data.json")
}

fn default_service_timeout() -> u64 {
    60
}

fn default_attribute() -> String {
    "workset".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Profile used when none is requested
    #[serde(default)]
    pub default_profile: Option<String>,

    /// Attribute key written by the mutation step
    #[serde(default = "default_attribute")]
    pub attribute: String,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Rule profiles
    #[serde(default)]
    pub profiles: Vec<Profile>,

    /// External feature detection
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,

    /// External model-query service
    #[serde(default)]
    pub model_service: Option<ModelServiceConfig>,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("walls".to_string()),
            attribute: default_attribute(),
            severity: SeverityThreshold::default(),
            profiles: vec![Profile::default_walls()],
            pipeline: None,
            model_service: None,
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config.profiles.is_empty() {
            config.profiles.push(Profile::default_walls());
        }

        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Look up a profile by name, or the default profile
    ///
    /// Without a name, `default_profile` is used, then the first profile.
    /// If a name appears twice, the last definition wins: later tables are
    /// treated as the revised version.
    pub fn profile(&self, name: Option<&str>) -> Result<&Profile, ConfigError> {
        let wanted = name.or(self.default_profile.as_deref());

        match wanted {
            Some(wanted) => self
                .profiles
                .iter()
                .rev()
                .find(|p| p.name == wanted)
                .ok_or_else(|| ConfigError::UnknownProfile(wanted.to_string())),
            None => self
                .profiles
                .first()
                .ok_or_else(|| ConfigError::UnknownProfile("<default>".to_string())),
        }
    }

    /// Resolve a path from the config against the project root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Pipeline settings with the working directory resolved
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut pipeline = self.pipeline.clone().unwrap_or_default();
        pipeline.working_dir = self.resolve_path(&pipeline.working_dir);
        pipeline
    }

    /// Model-service settings with the cache path resolved
    pub fn model_service_config(&self) -> ModelServiceConfig {
        let mut service = self.model_service.clone().unwrap_or_default();
        service.cache_file = self.resolve_path(&service.cache_file);
        service
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ClassificationRule, TargetId};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.attribute, "workset");
        let profile = config.profile(None).unwrap();
        assert_eq!(profile.name, "walls");
        assert_eq!(profile.name_source, NameSource::Type);
    }

    #[test]
    fn severity_override() {
        let mut threshold = SeverityThreshold::default();
        threshold.set_override(DiagnosticCode::RuleShadowed, Severity::Error);

        assert_eq!(
            threshold.get_severity(DiagnosticCode::RuleShadowed, Severity::Warn),
            Severity::Error
        );
        assert_eq!(
            threshold.get_severity(DiagnosticCode::RuleDuplicate, Severity::Warn),
            Severity::Warn
        );
    }

    #[test]
    fn parses_ordered_rules() {
        let config = Config::from_toml(
            r#"
            default_profile = "floors"

            [[profiles]]
            name = "floors"
            categories = ["Floors"]
            name_source = "instance"
            rules = [
                { prefix = "23", target = 1170 },
                { prefix = "2", target = "Vloeren" },
            ]
            "#,
        )
        .unwrap();

        let profile = config.profile(None).unwrap();
        assert_eq!(profile.name_source, NameSource::Instance);
        assert_eq!(
            profile.rules.rules(),
            &[
                ClassificationRule::new("23", 1170),
                ClassificationRule::new("2", TargetId::Name("Vloeren".to_string())),
            ]
        );
    }

    #[test]
    fn empty_config_falls_back_to_walls() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.profile(None).unwrap().name, "walls");
    }

    #[test]
    fn later_profile_definition_wins() {
        let config = Config::from_toml(
            r#"
            [[profiles]]
            name = "walls"
            categories = ["Walls"]
            rules = [{ prefix = "16", target = 1161 }]

            [[profiles]]
            name = "walls"
            categories = ["Walls"]
            rules = [{ prefix = "16", target = 2000 }]
            "#,
        )
        .unwrap();

        let profile = config.profile(Some("walls")).unwrap();
        assert_eq!(profile.rules.rules()[0].target, TargetId::Id(2000));
    }

    #[test]
    fn unknown_profile() {
        let config = Config::default();
        assert!(matches!(
            config.profile(Some("roofs")),
            Err(ConfigError::UnknownProfile(name)) if name == "roofs"
        ));
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut config = Config::default();
        config.pipeline = Some(PipelineConfig::default());
        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config.profiles, parsed.profiles);
        assert_eq!(config.pipeline, parsed.pipeline);
    }

    #[test]
    fn pipeline_paths_resolve_against_project_root() {
        let mut config = Config::default();
        config.project_root = PathBuf::from("/projects/site");
        config.pipeline = Some(PipelineConfig {
            working_dir: PathBuf::from("analysis"),
            ..PipelineConfig::default()
        });

        let pipeline = config.pipeline_config();
        assert_eq!(
            pipeline.output_path(),
            PathBuf::from("/projects/site/analysis/detected_features.json")
        );
    }

    #[test]
    fn from_file_sets_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wsmap.toml");
        Config::default().save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.project_root, dir.path());
    }
}
