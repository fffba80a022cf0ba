//! Drift detection: structured comparison of two forests.
//!
//! Useful for showing what a batch of edits (or an import) changed.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use taxonomy_kernel::domain::{Forest, TaxonomyNode};

/// Structured drift report between forest `a` (before) and `b` (after).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub node_count_a: i64,
    pub node_count_b: i64,
    pub node_count_delta: i64,
    pub active_count_a: i64,
    pub active_count_b: i64,
    pub active_count_delta: i64,
    pub added_nodes: Vec<String>,
    pub removed_nodes: Vec<String>,
    pub activated_nodes: Vec<String>,
    pub deactivated_nodes: Vec<String>,
    pub renamed_nodes: Vec<String>,
    pub moved_nodes: Vec<String>,
}

impl DriftReport {
    /// True when nothing structural or visible changed.
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.activated_nodes.is_empty()
            && self.deactivated_nodes.is_empty()
            && self.renamed_nodes.is_empty()
            && self.moved_nodes.is_empty()
    }
}

fn index(forest: &Forest) -> BTreeMap<&str, &TaxonomyNode> {
    forest.iter().map(|n| (n.id.as_str(), n)).collect()
}

/// Compare two forests. Id lists are sorted.
pub fn compare_forests(a: &Forest, b: &Forest) -> DriftReport {
    let nodes_a = index(a);
    let nodes_b = index(b);
    let ids_a: BTreeSet<&str> = nodes_a.keys().copied().collect();
    let ids_b: BTreeSet<&str> = nodes_b.keys().copied().collect();

    let mut report = DriftReport {
        node_count_a: nodes_a.len() as i64,
        node_count_b: nodes_b.len() as i64,
        node_count_delta: nodes_b.len() as i64 - nodes_a.len() as i64,
        active_count_a: a.active_count() as i64,
        active_count_b: b.active_count() as i64,
        active_count_delta: b.active_count() as i64 - a.active_count() as i64,
        added_nodes: ids_b.difference(&ids_a).map(|s| s.to_string()).collect(),
        removed_nodes: ids_a.difference(&ids_b).map(|s| s.to_string()).collect(),
        ..Default::default()
    };

    for id in ids_a.intersection(&ids_b) {
        let before = nodes_a[id];
        let after = nodes_b[id];
        if !before.is_active && after.is_active {
            report.activated_nodes.push(id.to_string());
        } else if before.is_active && !after.is_active {
            report.deactivated_nodes.push(id.to_string());
        }
        if before.name != after.name {
            report.renamed_nodes.push(id.to_string());
        }
        if before.parent_id != after.parent_id {
            report.moved_nodes.push(id.to_string());
        }
    }

    report
}
