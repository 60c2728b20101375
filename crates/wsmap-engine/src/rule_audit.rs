//! Rule table audit
//!
//! Reports rules that can never fire under first-match-wins evaluation, and
//! prefixes that were redefined. The classifier itself never changes
//! behaviour based on these findings.

use wsmap_core::{Diagnostic, DiagnosticCode, Location, RuleTable, Severity, SeverityThreshold};

/// Audit one profile's rule table
pub fn audit(profile: &str, rules: &RuleTable, severity: &SeverityThreshold) -> Vec<Diagnostic> {
    let rules = rules.rules();
    let mut diagnostics = Vec::new();

    let make = |code: DiagnosticCode, default: Severity, index: usize, message: String| {
        Diagnostic::new(code, severity.get_severity(code, default), message)
            .with_location(Location::rule(profile, index))
    };

    for (index, rule) in rules.iter().enumerate() {
        if rule.prefix.is_empty() {
            diagnostics.push(make(
                DiagnosticCode::RuleEmptyPrefix,
                Severity::Warn,
                index,
                format!("Rule #{} has an empty prefix and matches every named entity", index),
            ));
        }

        let earlier = &rules[..index];

        // Same prefix defined earlier: the first definition is authoritative
        if let Some((first, original)) = earlier
            .iter()
            .enumerate()
            .find(|(_, r)| r.prefix == rule.prefix)
        {
            if original.target == rule.target {
                diagnostics.push(make(
                    DiagnosticCode::RuleDuplicate,
                    Severity::Warn,
                    index,
                    format!(
                        "Rule #{} repeats prefix '{}' from rule #{}",
                        index, rule.prefix, first
                    ),
                ));
            } else {
                diagnostics.push(
                    make(
                        DiagnosticCode::RuleContradiction,
                        Severity::Error,
                        index,
                        format!(
                            "Rule #{} maps prefix '{}' to {}, but rule #{} already maps it to {}",
                            index, rule.prefix, rule.target, first, original.target
                        ),
                    )
                    .with_comparison(original.target.to_string(), rule.target.to_string()),
                );
            }
        }

        if let Some((first, shadowing)) = earlier
            .iter()
            .enumerate()
            .find(|(_, r)| {
                r.prefix.len() < rule.prefix.len() && rule.prefix.starts_with(r.prefix.as_str())
            })
        {
            diagnostics.push(make(
                DiagnosticCode::RuleShadowed,
                Severity::Warn,
                index,
                format!(
                    "Rule #{} ('{}') can never match: rule #{} ('{}') matches first",
                    index, rule.prefix, first, shadowing.prefix
                ),
            ));
        }
    }

    tracing::debug!(
        profile,
        rules = rules.len(),
        findings = diagnostics.len(),
        "Rule audit finished"
    );
    diagnostics
}
