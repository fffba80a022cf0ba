/// Taxonomy Kernel: Invariant Checks
///
/// Non-panicking validation of a whole forest. Each check returns the
/// first violation it finds, tagged `[INVARIANT:<tag>]`.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::domain::{Forest, NodeType, TaxonomyNode};
use crate::ids::is_valid_node_id;
use crate::proficiency::validate_levels;

/// A broken forest invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[INVARIANT:{tag}] {message}")]
pub struct InvariantViolation {
    pub tag: &'static str,
    pub message: String,
}

impl InvariantViolation {
    fn new(tag: &'static str, message: String) -> Self {
        Self { tag, message }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every invariant check. Returns the first failure.
pub fn try_validate_invariants(forest: &Forest) -> Result<(), InvariantViolation> {
    check_node_id_format(forest)?;
    check_unique_ids(forest)?;
    check_names(forest)?;
    check_parent_links(forest)?;
    check_level_placement(forest)?;
    check_cascade(forest)?;
    check_timestamps(forest)?;
    check_proficiency(forest)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

fn check_node_id_format(forest: &Forest) -> Result<(), InvariantViolation> {
    match forest.iter().find(|n| !is_valid_node_id(&n.id)) {
        Some(n) => Err(InvariantViolation::new(
            "node_id_format",
            format!("node id {:?} must match [A-Za-z0-9_-]+", n.id),
        )),
        None => Ok(()),
    }
}

/// Every node appears exactly once.
fn check_unique_ids(forest: &Forest) -> Result<(), InvariantViolation> {
    let mut seen = BTreeSet::new();
    for node in forest.iter() {
        if !seen.insert(node.id.as_str()) {
            return Err(InvariantViolation::new(
                "duplicate_node_id",
                format!("node id {:?} appears more than once", node.id),
            ));
        }
    }
    Ok(())
}

fn check_names(forest: &Forest) -> Result<(), InvariantViolation> {
    match forest.iter().find(|n| n.name.trim().is_empty()) {
        Some(n) => Err(InvariantViolation::new(
            "empty_name",
            format!("node {:?} has an empty name", n.id),
        )),
        None => Ok(()),
    }
}

/// Roots have no parent; every child points back at its holder.
fn check_parent_links(forest: &Forest) -> Result<(), InvariantViolation> {
    for root in &forest.roots {
        if let Some(pid) = &root.parent_id {
            return Err(InvariantViolation::new(
                "tree_parent",
                format!("root {:?} declares parent {:?}", root.id, pid),
            ));
        }
    }
    for node in forest.iter() {
        for child in &node.children {
            if child.parent_id.as_deref() != Some(node.id.as_str()) {
                return Err(InvariantViolation::new(
                    "tree_parent",
                    format!(
                        "node {:?} sits under {:?} but declares parent {:?}",
                        child.id, node.id, child.parent_id
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// cluster -> group -> skill, skills are leaves.
fn check_level_placement(forest: &Forest) -> Result<(), InvariantViolation> {
    for root in &forest.roots {
        if root.node_type != NodeType::Cluster {
            return Err(InvariantViolation::new(
                "level_placement",
                format!("root {:?} is a {}, expected a cluster", root.id, root.node_type),
            ));
        }
    }
    for node in forest.iter() {
        for child in &node.children {
            if node.node_type.child_type() != Some(child.node_type) {
                return Err(InvariantViolation::new(
                    "level_placement",
                    format!(
                        "{} {:?} cannot hold {} {:?}",
                        node.node_type, node.id, child.node_type, child.id
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// No active node beneath an inactive one.
fn check_cascade(forest: &Forest) -> Result<(), InvariantViolation> {
    fn walk(node: &TaxonomyNode) -> Result<(), InvariantViolation> {
        for child in &node.children {
            if !node.is_active && child.is_active {
                return Err(InvariantViolation::new(
                    "inactive_cascade",
                    format!(
                        "node {:?} is active under inactive {:?}",
                        child.id, node.id
                    ),
                ));
            }
            walk(child)?;
        }
        Ok(())
    }
    forest.roots.iter().try_for_each(walk)
}

fn check_timestamps(forest: &Forest) -> Result<(), InvariantViolation> {
    match forest.iter().find(|n| n.updated_at < n.created_at) {
        Some(n) => Err(InvariantViolation::new(
            "timestamps",
            format!("node {:?} updated_at precedes created_at", n.id),
        )),
        None => Ok(()),
    }
}

fn check_proficiency(forest: &Forest) -> Result<(), InvariantViolation> {
    for node in forest.iter() {
        if let Some(levels) = &node.proficiency_levels {
            if node.node_type != NodeType::Skill {
                return Err(InvariantViolation::new(
                    "proficiency_levels",
                    format!("{} {:?} carries proficiency levels", node.node_type, node.id),
                ));
            }
            validate_levels(levels).map_err(|e| {
                InvariantViolation::new("proficiency_levels", format!("node {:?}: {}", node.id, e))
            })?;
        }
    }
    Ok(())
}
