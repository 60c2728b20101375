//! Prefix classification
//!
//! A name is classified by the first rule whose prefix it starts with, in
//! table order. Matching is literal and case-sensitive: no trimming, no
//! normalization. Shorter prefixes listed first win over longer ones listed
//! later, so `"220_NCG"` is caught by a `"22"` rule.

use wsmap_core::{ClassificationRule, TargetId};

/// Result of classifying one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched(TargetId),
    Unmatched,
}

impl Classification {
    pub fn target(&self) -> Option<&TargetId> {
        match self {
            Self::Matched(target) => Some(target),
            Self::Unmatched => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched(target) => write!(f, "{}", target),
            Self::Unmatched => write!(f, "UNMATCHED"),
        }
    }
}

/// Classify a name against an ordered rule list
///
/// A missing or empty name is always `Unmatched`, even when the table has an
/// empty-prefix rule.
pub fn classify(name: Option<&str>, rules: &[ClassificationRule]) -> Classification {
    match matching_rule(name, rules) {
        Some((_, rule)) => Classification::Matched(rule.target.clone()),
        None => Classification::Unmatched,
    }
}

/// The first rule matching `name`, with its index
pub fn matching_rule<'a>(
    name: Option<&str>,
    rules: &'a [ClassificationRule],
) -> Option<(usize, &'a ClassificationRule)> {
    let name = name.filter(|n| !n.is_empty())?;

    rules
        .iter()
        .enumerate()
        .find(|(_, rule)| name.starts_with(rule.prefix.as_str()))
}
