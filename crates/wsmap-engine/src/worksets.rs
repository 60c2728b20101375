//! Workset creation planning

use serde::{Deserialize, Serialize};

/// Which requested worksets to create, and which already exist
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorksetPlan {
    pub create: Vec<String>,
    pub skipped: Vec<String>,
}

/// Plan the creation of `requested` worksets given the `existing` names
///
/// Names are trimmed and blanks dropped. A name that already exists, or
/// appears earlier in the request, is skipped. Both lists keep request order.
pub fn plan_worksets<'a, R, E>(requested: R, existing: E) -> WorksetPlan
where
    R: IntoIterator<Item = &'a str>,
    E: IntoIterator<Item = &'a str>,
{
    let existing: Vec<&str> = existing.into_iter().map(str::trim).collect();
    let mut plan = WorksetPlan::default();

    for name in requested.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
        if existing.contains(&name) || plan.create.iter().any(|c| c == name) {
            plan.skipped.push(name.to_string());
        } else {
            plan.create.push(name.to_string());
        }
    }

    tracing::debug!(create = plan.create.len(), skipped = plan.skipped.len(), "Workset plan ready");
    plan
}
