//! wsmap core
//!
//! Domain model shared by every wsmap crate: rule tables, diagnostics,
//! batch outcomes, reports and configuration.
//! Never rename diagnostic codes - they are part of the report format.

pub mod rule;
pub mod diagnostic;
pub mod outcome;
pub mod report;
pub mod config;

pub use rule::{Category, ClassificationRule, EntityId, RuleTable, TargetId};
pub use diagnostic::{Diagnostic, DiagnosticCode, Location, Severity};
pub use outcome::{Assignment, AssignmentStatus, BatchOutcome, Failure};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{
    Config, ConfigError, ModelServiceConfig, NameSource, PipelineConfig, Profile,
    SeverityThreshold,
};
