//! wsmap engine - classification and batch mutation
//!
//! This crate implements the host-agnostic logic:
//! - Prefix classification against ordered rule tables
//! - Per-entity mutation inside a unit of work
//! - The batch orchestrator and its outcome counts
//! - Rule table auditing
//! - Sheet list and workset creation planning

pub mod classifier;
pub mod applicator;
pub mod orchestrator;
pub mod rule_audit;
pub mod sheets;
pub mod worksets;

pub use classifier::{classify, matching_rule, Classification};
pub use applicator::{apply, apply_value, MutationError};
pub use orchestrator::{BatchRun, Orchestrator, OrchestratorError};
pub use rule_audit::audit;
pub use sheets::{parse_sheet_list, SheetInputError, SheetRow};
pub use worksets::{plan_worksets, WorksetPlan};
