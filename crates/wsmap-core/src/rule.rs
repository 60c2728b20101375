//! Classification rules and the values they map to

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Grouping id a rule assigns (a workset id on most hosts)
///
/// Hosts use integer ids, but some rule tables name their targets instead,
/// so both forms are accepted. Serialized untagged: `1161` or `"Fundering"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetId {
    /// Numeric host id
    Id(i64),

    /// Symbolic target name
    Name(String),
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<i64> for TargetId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TargetId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// Opaque handle to a host-owned element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host element category (e.g. `Walls`, `Floors`, `PointClouds`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single `prefix -> target` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    /// Literal, case-sensitive name prefix
    pub prefix: String,

    /// Target assigned when the prefix matches
    pub target: TargetId,
}

impl ClassificationRule {
    pub fn new(prefix: impl Into<String>, target: impl Into<TargetId>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

/// Ordered rule table
///
/// Order is significant: the first rule whose prefix matches wins, even when
/// a later rule has a longer (more specific) prefix. Kept as a `Vec` so that
/// iteration order never depends on hashing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<ClassificationRule>,
}

impl RuleTable {
    /// Create a table from rules in evaluation order
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// Build a table from `(prefix, target)` pairs, preserving order
    pub fn from_pairs<P, T>(pairs: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: Into<String>,
        T: Into<TargetId>,
    {
        Self {
            rules: pairs
                .into_iter()
                .map(|(prefix, target)| ClassificationRule::new(prefix, target))
                .collect(),
        }
    }

    /// Append a rule at the lowest priority
    pub fn push(&mut self, rule: ClassificationRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Stable SHA-256 fingerprint of the ordered rules
    ///
    /// Two tables with the same rules in a different order have different
    /// fingerprints, since they can classify differently.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for rule in &self.rules {
            hasher.update(rule.prefix.as_bytes());
            hasher.update([0u8]);
            match &rule.target {
                TargetId::Id(id) => {
                    hasher.update(b"i:");
                    hasher.update(id.to_string().as_bytes());
                }
                TargetId::Name(name) => {
                    hasher.update(b"s:");
                    hasher.update(name.as_bytes());
                }
            }
            hasher.update([b'\n']);
        }
        hex::encode(hasher.finalize())
    }

    /// Wall workset table used when no configuration is supplied
    ///
    /// Prefixes are wall type codes; ids are the project's workset ids
    /// (1161 foundation, 1164 exterior walls, 1165 interior walls).
    pub fn default_walls() -> Self {
        Self::from_pairs([
            ("16", 1161),
            ("21", 1164),
            ("L4-S-2", 1164),
            ("22", 1165),
            ("42", 1165),
            ("L4-D-1", 1165),
            ("L4-H", 1165),
            ("L4-K", 1165),
            ("L4-S-1", 1165),
        ])
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a ClassificationRule;
    type IntoIter = std::slice::Iter<'a, ClassificationRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_id_untagged_serde() {
        let id: TargetId = serde_json::from_str("1161").unwrap();
        assert_eq!(id, TargetId::Id(1161));

        let name: TargetId = serde_json::from_str("\"Fundering\"").unwrap();
        assert_eq!(name, TargetId::Name("Fundering".to_string()));
    }

    #[test]
    fn table_preserves_insertion_order() {
        let table = RuleTable::from_pairs([("2", "A"), ("21", "B")]);
        let prefixes: Vec<&str> = table.rules().iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["2", "21"]);
    }

    #[test]
    fn fingerprint_depends_on_order() {
        let a = RuleTable::from_pairs([("2", 1), ("21", 2)]);
        let b = RuleTable::from_pairs([("21", 2), ("2", 1)]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_distinguishes_numeric_and_named_targets() {
        let numeric = RuleTable::from_pairs([("16", TargetId::Id(1))]);
        let named = RuleTable::from_pairs([("16", TargetId::Name("1".to_string()))]);
        assert_ne!(numeric.fingerprint(), named.fingerprint());
    }

    #[test]
    fn default_walls_table() {
        let table = RuleTable::default_walls();
        assert_eq!(table.len(), 9);
        assert_eq!(table.rules()[0], ClassificationRule::new("16", 1161));
    }
}
