//! Test fixtures for orchestrator integration tests
//!
//! Reusable rule tables and mock hosts modelled on a typical wall workset
//! setup: foundation walls (16), exterior walls (21) and interior walls (22).

#![allow(dead_code)]

use wsmap_core::RuleTable;
use wsmap_host::{Attribute, MockEntity, MockHost};

pub const ATTRIBUTE: &str = "workset";

/// The three-rule wall table
pub fn wall_rules() -> RuleTable {
    RuleTable::from_pairs([("16", 1161), ("21", 1164), ("22", 1165)])
}

/// A wall with a writable workset attribute
pub fn wall(id: i64, name: &str) -> MockEntity {
    MockEntity::new(id, "Walls", name).with_attribute(ATTRIBUTE, Attribute::writable(0))
}

/// Mock host holding one wall per name, ids starting at 1
pub fn host_with_walls(names: &[&str]) -> MockHost {
    names
        .iter()
        .enumerate()
        .fold(MockHost::new(), |host, (i, name)| host.with_entity(wall(i as i64 + 1, name)))
}

/// A mixed model: walls of every kind plus a floor and an unnamed wall
pub fn mixed_model() -> MockHost {
    host_with_walls(&["16_foundation", "21_outer", "22_inner", "99_unknown"])
        .with_entity(
            MockEntity::new(5, "Floors", "21_floor")
                .with_attribute(ATTRIBUTE, Attribute::writable(0)),
        )
        .with_entity(
            MockEntity::unnamed(6, "Walls").with_attribute(ATTRIBUTE, Attribute::writable(0)),
        )
}
