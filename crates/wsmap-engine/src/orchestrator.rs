//! Batch orchestrator
//!
//! One pass over the entities a host enumerates: read the name, classify it,
//! and hand matched entities to the applicator. Per-entity failures are
//! counted and the run continues; only enumeration failure aborts it.

use wsmap_core::{
    Assignment, AssignmentStatus, BatchOutcome, Category, ClassificationRule, Diagnostic,
    DiagnosticCode, EntityId, Location, Profile, RuleTable, Severity, SeverityThreshold,
};
use wsmap_host::{HostContext, HostError};
use crate::applicator::apply;
use crate::classifier::{classify, Classification};

/// Errors that abort a whole run
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Failed to enumerate entities: {0}")]
    Enumeration(#[from] HostError),
}

/// Everything one run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRun {
    pub outcome: BatchOutcome,

    /// One record per enumerated entity, in host order
    pub assignments: Vec<Assignment>,

    pub diagnostics: Vec<Diagnostic>,
}

impl BatchRun {
    /// Number of entities the run looked at
    pub fn entities(&self) -> usize {
        self.assignments.len()
    }
}

/// Drives classification and mutation for one host
pub struct Orchestrator<'h, H: HostContext + ?Sized> {
    host: &'h mut H,
    attribute: String,
    dry_run: bool,
    severity: SeverityThreshold,
}

impl<'h, H: HostContext + ?Sized> Orchestrator<'h, H> {
    /// Create an orchestrator writing targets into `attribute`
    pub fn new(host: &'h mut H, attribute: impl Into<String>) -> Self {
        Self {
            host,
            attribute: attribute.into(),
            dry_run: false,
            severity: SeverityThreshold::default(),
        }
    }

    /// Classify only; never open a unit of work
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_severity(mut self, severity: SeverityThreshold) -> Self {
        self.severity = severity;
        self
    }

    /// Run a profile: its categories against its rule table
    pub fn run_profile(&mut self, profile: &Profile) -> Result<BatchRun, OrchestratorError> {
        self.run(&profile.categories, &profile.rules)
    }

    /// Enumerate `categories` and classify every entity against `rules`
    pub fn run(
        &mut self,
        categories: &[Category],
        rules: &RuleTable,
    ) -> Result<BatchRun, OrchestratorError> {
        let entities = self.host.enumerate(categories)?;
        tracing::info!(
            host = self.host.name(),
            entities = entities.len(),
            rules = rules.len(),
            dry_run = self.dry_run,
            "Starting classification run"
        );

        Ok(self.run_entities(&entities, rules.rules()))
    }

    /// Classify and mutate an explicit entity sequence
    pub fn run_entities(
        &mut self,
        entities: &[EntityId],
        rules: &[ClassificationRule],
    ) -> BatchRun {
        let mut run = BatchRun::default();

        for &entity in entities {
            let name = match self.host.display_name(entity) {
                Ok(name) => name,
                Err(error) => {
                    tracing::warn!(entity = %entity, error = %error, "Could not read entity name");
                    run.outcome.record_failure(entity, format!("Name unavailable: {}", error));
                    run.diagnostics.push(self.diagnostic(
                        DiagnosticCode::EntityNameUnavailable,
                        Severity::Warn,
                        entity,
                        format!("Could not read name of entity {}: {}", entity, error),
                    ));
                    run.assignments.push(Assignment {
                        entity,
                        name: None,
                        target: None,
                        status: AssignmentStatus::Failed,
                    });
                    continue;
                }
            };

            let target = match classify(name.as_deref(), rules) {
                Classification::Matched(target) => target,
                Classification::Unmatched => {
                    tracing::debug!(entity = %entity, name = ?name, "No matching rule");
                    run.outcome.record_unclassified();
                    run.diagnostics.push(self.diagnostic(
                        DiagnosticCode::EntityUnmatched,
                        Severity::Info,
                        entity,
                        format!(
                            "No rule matches entity {} ({})",
                            entity,
                            name.as_deref().unwrap_or("<unnamed>")
                        ),
                    ));
                    run.assignments.push(Assignment {
                        entity,
                        name,
                        target: None,
                        status: AssignmentStatus::Unmatched,
                    });
                    continue;
                }
            };

            run.outcome.record_classified();

            let status = if self.dry_run {
                AssignmentStatus::Planned
            } else {
                match apply(&mut *self.host, entity, &self.attribute, &target) {
                    Ok(()) => {
                        run.outcome.record_success();
                        AssignmentStatus::Assigned
                    }
                    Err(error) => {
                        let message = format!(
                            "Could not assign {} to entity {}: {}",
                            target, entity, error
                        );
                        run.outcome.record_failure(entity, error.to_string());
                        run.diagnostics.push(
                            self.diagnostic(error.code(), Severity::Warn, entity, message)
                                .with_comparison(target.to_string(), "unchanged"),
                        );
                        AssignmentStatus::Failed
                    }
                }
            };

            run.assignments.push(Assignment {
                entity,
                name,
                target: Some(target),
                status,
            });
        }

        tracing::info!(
            classified = run.outcome.classified,
            unclassified = run.outcome.unclassified,
            succeeded = run.outcome.mutation_succeeded,
            failed = run.outcome.mutation_failed,
            "Classification run finished"
        );

        run
    }

    fn diagnostic(
        &self,
        code: DiagnosticCode,
        default: Severity,
        entity: EntityId,
        message: String,
    ) -> Diagnostic {
        Diagnostic::new(code, self.severity.get_severity(code, default), message)
            .with_location(Location::entity(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wsmap_core::TargetId;
    use wsmap_host::{Attribute, AttributeValue, MockEntity, MockHost};

    fn wall(id: i64, name: &str) -> MockEntity {
        MockEntity::new(id, "Walls", name).with_attribute("workset", Attribute::writable(0))
    }

    fn rules() -> RuleTable {
        RuleTable::from_pairs([("16", 1161), ("21", 1164), ("22", 1165)])
    }

    #[test]
    fn classifies_and_assigns() {
        let mut host = MockHost::new()
            .with_entity(wall(1, "16_foundation"))
            .with_entity(wall(2, "21_outer"))
            .with_entity(wall(3, "99_unknown"));

        let run = Orchestrator::new(&mut host, "workset")
            .run(&[Category::new("Walls")], &rules())
            .unwrap();

        assert_eq!(run.outcome.classified, 2);
        assert_eq!(run.outcome.unclassified, 1);
        assert_eq!(run.outcome.mutation_succeeded, 2);
        assert_eq!(run.entities(), 3);
        assert_eq!(host.value(EntityId(1), "workset"), Some(&AttributeValue::Integer(1161)));
        assert_eq!(host.value(EntityId(2), "workset"), Some(&AttributeValue::Integer(1164)));
        assert_eq!(host.value(EntityId(3), "workset"), Some(&AttributeValue::Integer(0)));
    }

    #[test]
    fn dry_run_never_writes() {
        let mut host = MockHost::new().with_entity(wall(1, "21_outer"));

        let run = Orchestrator::new(&mut host, "workset")
            .with_dry_run(true)
            .run(&[], &rules())
            .unwrap();

        assert_eq!(run.outcome.classified, 1);
        assert_eq!(run.outcome.mutation_succeeded, 0);
        assert_eq!(run.assignments[0].status, AssignmentStatus::Planned);
        assert_eq!(run.assignments[0].target, Some(TargetId::Id(1164)));
        assert_eq!(host.set_calls(), 0);
        assert_eq!(host.commits(), 0);
    }

    #[test]
    fn name_failure_counts_as_failed_mutation() {
        let mut host = MockHost::new()
            .with_entity(wall(1, "21_outer"))
            .with_entity(wall(2, "22_inner"))
            .with_name_error_for(
                EntityId(1),
                HostError::Unavailable("element deleted".to_string()),
            );

        let run = Orchestrator::new(&mut host, "workset").run(&[], &rules()).unwrap();

        assert_eq!(run.outcome.mutation_failed, 1);
        assert_eq!(run.outcome.mutation_succeeded, 1);
        assert_eq!(run.outcome.classified, 1);
        assert_eq!(run.outcome.failures[0].entity, EntityId(1));
        assert_eq!(run.diagnostics[0].code, DiagnosticCode::EntityNameUnavailable);
    }

    #[test]
    fn enumeration_failure_aborts() {
        let mut host = MockHost::new().with_enumeration_failure();
        let result = Orchestrator::new(&mut host, "workset").run(&[], &rules());
        assert!(matches!(result, Err(OrchestratorError::Enumeration(_))));
    }

    #[test]
    fn unnamed_entity_is_unclassified() {
        let mut host = MockHost::new().with_entity(
            MockEntity::unnamed(1, "Walls").with_attribute("workset", Attribute::writable(0)),
        );

        let run = Orchestrator::new(&mut host, "workset").run(&[], &rules()).unwrap();
        assert_eq!(run.outcome.unclassified, 1);
        assert_eq!(host.set_calls(), 0);
    }

    #[test]
    fn mutation_failure_severity_can_be_raised() {
        let mut host = MockHost::new().with_entity(MockEntity::new(1, "Walls", "21_outer"));
        let mut severity = SeverityThreshold::default();
        severity.set_override(DiagnosticCode::MutationAttributeMissing, Severity::Error);

        let run = Orchestrator::new(&mut host, "workset")
            .with_severity(severity)
            .run(&[], &rules())
            .unwrap();

        assert_eq!(run.diagnostics.len(), 1);
        assert_eq!(run.diagnostics[0].severity, Severity::Error);
        assert_eq!(run.assignments[0].status, AssignmentStatus::Failed);
    }
}
