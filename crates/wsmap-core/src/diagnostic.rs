//! Diagnostic codes and error reporting
//!
//! Diagnostic codes are stable strings written into reports.
//! Do not rename or remove codes; add new ones instead.

use serde::{Deserialize, Serialize};
use crate::rule::EntityId;

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Rule table audit
    /// A prefix repeats with a different target; the first occurrence wins
    RuleContradiction,

    /// A prefix repeats with the same target
    RuleDuplicate,

    /// A shorter earlier prefix makes a later rule unreachable
    RuleShadowed,

    /// An empty prefix matches every non-empty name
    RuleEmptyPrefix,

    // Batch mutation
    /// No rule matched the entity name
    EntityUnmatched,

    /// The host could not provide the entity name
    EntityNameUnavailable,

    /// The target attribute does not exist on the entity
    MutationAttributeMissing,

    /// The target attribute is read-only
    MutationReadOnly,

    /// The host rejected the write or the unit of work
    MutationHostRejected,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleContradiction => "RULE_CONTRADICTION",
            Self::RuleDuplicate => "RULE_DUPLICATE",
            Self::RuleShadowed => "RULE_SHADOWED",
            Self::RuleEmptyPrefix => "RULE_EMPTY_PREFIX",
            Self::EntityUnmatched => "ENTITY_UNMATCHED",
            Self::EntityNameUnavailable => "ENTITY_NAME_UNAVAILABLE",
            Self::MutationAttributeMissing => "MUTATION_ATTRIBUTE_MISSING",
            Self::MutationReadOnly => "MUTATION_READ_ONLY",
            Self::MutationHostRejected => "MUTATION_HOST_REJECTED",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Should be reviewed but does not fail the run
    Warn,

    /// Fails the run (non-zero exit from the CLI)
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// What a diagnostic points at
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Profile (rule table) name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Zero-based rule index within the profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<usize>,

    /// Host entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityId>,
}

impl Location {
    /// Location of a rule inside a profile
    pub fn rule(profile: impl Into<String>, index: usize) -> Self {
        Self {
            profile: Some(profile.into()),
            rule: Some(index),
            entity: None,
        }
    }

    /// Location of a host entity
    pub fn entity(id: EntityId) -> Self {
        Self {
            profile: None,
            rule: None,
            entity: Some(id),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(profile) = &self.profile {
            parts.push(format!("profile '{}'", profile));
        }
        if let Some(rule) = self.rule {
            parts.push(format!("rule #{}", rule + 1));
        }
        if let Some(entity) = self.entity {
            parts.push(format!("entity {}", entity));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// What the diagnostic refers to
    pub location: Option<Location>,

    /// Expected value (for comparison diagnostics)
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    pub actual: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}
