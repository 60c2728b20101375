//! Per-run batch outcome

use serde::{Deserialize, Serialize};
use crate::rule::{EntityId, TargetId};

/// A mutation that did not happen, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub entity: EntityId,
    pub message: String,
}

/// What happened to one entity during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Target written and unit of work committed
    Assigned,

    /// Matched, but the mutation failed
    Failed,

    /// Matched in a dry run; nothing written
    Planned,

    /// No rule matched
    Unmatched,
}

/// Per-entity record kept for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub entity: EntityId,

    /// Name used for classification (absent if the host could not provide it)
    pub name: Option<String>,

    pub target: Option<TargetId>,

    pub status: AssignmentStatus,
}

/// Aggregated counts for one orchestrator run
///
/// `classified + unclassified` is the number of entities whose name could be
/// read. An entity whose name could not be read is counted only as a failed
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub classified: usize,
    pub unclassified: usize,
    pub mutation_succeeded: usize,
    pub mutation_failed: usize,
    pub failures: Vec<Failure>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unclassified(&mut self) {
        self.unclassified += 1;
    }

    pub fn record_classified(&mut self) {
        self.classified += 1;
    }

    pub fn record_success(&mut self) {
        self.mutation_succeeded += 1;
    }

    pub fn record_failure(&mut self, entity: EntityId, message: impl Into<String>) {
        self.mutation_failed += 1;
        self.failures.push(Failure {
            entity,
            message: message.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        self.mutation_failed > 0
    }
}
