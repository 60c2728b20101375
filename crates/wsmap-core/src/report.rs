//! Run report (stable v1)
//!
//! This schema is versioned. Breaking changes require a new major version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};
use crate::outcome::{Assignment, BatchOutcome};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Diagnostic counts by severity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of diagnostics
    pub total: usize,

    /// Number of errors
    pub errors: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of info messages
    pub info: usize,
}

/// Report for one classification run (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Profile the rules came from
    pub profile: String,

    /// Fingerprint of the ordered rule table
    pub rules_fingerprint: String,

    /// Whether the run wrote anything
    pub dry_run: bool,

    /// Batch counts and failures
    pub outcome: BatchOutcome,

    /// Diagnostic counts
    pub summary: ReportSummary,

    /// Per-entity results
    #[serde(default)]
    pub assignments: Vec<Assignment>,

    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,

    /// Metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Report {
    /// Create an empty report for a profile
    pub fn new(profile: impl Into<String>, rules_fingerprint: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            profile: profile.into(),
            rules_fingerprint: rules_fingerprint.into(),
            dry_run: false,
            outcome: BatchOutcome::default(),
            summary: ReportSummary::default(),
            assignments: Vec::new(),
            diagnostics: Vec::new(),
            metadata: None,
        }
    }

    /// Attach the batch outcome and per-entity assignments
    pub fn with_outcome(mut self, outcome: BatchOutcome, assignments: Vec<Assignment>) -> Self {
        self.outcome = outcome;
        self.assignments = assignments;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warn => self.summary.warnings += 1,
            Severity::Info => self.summary.info += 1,
        }

        self.summary.total += 1;
        self.diagnostics.push(diagnostic);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add_diagnostic(diagnostic);
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Render a Markdown summary
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Workset Classification Report\n\n");
        md.push_str(&format!("**Version:** {}\n\n", self.version));
        md.push_str(&format!("**Timestamp:** {}\n\n", self.timestamp));
        md.push_str(&format!("**Profile:** {} (`{}`)\n\n", self.profile, &self.rules_fingerprint));
        if self.dry_run {
            md.push_str("_Dry run: no changes were written._\n\n");
        }

        md.push_str("## Outcome\n\n");
        md.push_str(&format!("- Classified: {}\n", self.outcome.classified));
        md.push_str(&format!("- Unclassified: {}\n", self.outcome.unclassified));
        md.push_str(&format!("- Mutations succeeded: {}\n", self.outcome.mutation_succeeded));
        md.push_str(&format!("- Mutations failed: {}\n\n", self.outcome.mutation_failed));

        if !self.outcome.failures.is_empty() {
            md.push_str("## Failures\n\n");
            md.push_str("| Entity | Error |\n|---|---|\n");
            for failure in &self.outcome.failures {
                md.push_str(&format!("| {} | {} |\n", failure.entity, failure.message));
            }
            md.push('\n');
        }

        if !self.diagnostics.is_empty() {
            md.push_str("## Diagnostics\n\n");
            for diag in &self.diagnostics {
                md.push_str(&format!("- **{}** {}: {}", diag.severity, diag.code, diag.message));
                if let Some(loc) = &diag.location {
                    md.push_str(&format!(" ({})", loc));
                }
                md.push('\n');
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticCode;
    use crate::rule::EntityId;

    #[test]
    fn empty_report() {
        let report = Report::new("walls", "abc");
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.total, 0);
        assert!(!report.has_errors());
    }

    #[test]
    fn report_counts_diagnostics() {
        let mut report = Report::new("walls", "abc");
        report.extend_diagnostics(vec![
            Diagnostic::new(DiagnosticCode::RuleContradiction, Severity::Error, "contradiction"),
            Diagnostic::new(DiagnosticCode::RuleShadowed, Severity::Warn, "shadowed"),
            Diagnostic::new(DiagnosticCode::EntityUnmatched, Severity::Info, "unmatched"),
        ]);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.warnings, 1);
        assert!(report.has_errors());
    }

    #[test]
    fn report_serialization() {
        let report = Report::new("walls", "abc").with_dry_run(true);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"rules_fingerprint\": \"abc\""));
        assert!(json.contains("\"dry_run\": true"));
    }

    #[test]
    fn markdown_lists_failures() {
        let mut outcome = BatchOutcome::new();
        outcome.record_classified();
        outcome.record_failure(EntityId(12), "attribute is read-only");
        let report = Report::new("walls", "abc").with_outcome(outcome, Vec::new());

        let md = report.to_markdown();
        assert!(md.contains("- Mutations failed: 1"));
        assert!(md.contains("| 12 | attribute is read-only |"));
    }
}
