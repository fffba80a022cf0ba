/// Taxonomy Kernel: Forest Operations
///
/// ALL forest mutation lives here.
/// Every operation takes `&Forest` and returns a new forest. The input is
/// never mutated: it is cloned first and the clone is edited in place.
/// Missing references are returned as errors, never silently ignored.

use chrono::{DateTime, Utc};

use crate::domain::{Forest, NodeDraft, NodePatch, NodeType, TaxonomyNode};
use crate::error::TaxonomyError;
use crate::ids::{new_node_id, validate_node_id, NodeId};
use crate::proficiency::{sorted_levels, validate_levels};
use crate::tree::{ancestors_of, collect_descendants, contains_id, find_node_by_id, find_node_mut};

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

/// Build a node from `draft` and append it as the last root (no parent)
/// or as the last child of `draft.parent_id`.
///
/// Returns the new forest and the id of the created node.
pub fn insert_node(
    forest: &Forest,
    draft: NodeDraft,
    now: DateTime<Utc>,
) -> Result<(Forest, NodeId), TaxonomyError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(TaxonomyError::InvalidName);
    }

    let id = match draft.id {
        Some(id) => {
            validate_node_id(&id)?;
            if contains_id(forest, &id) {
                return Err(TaxonomyError::DuplicateId(id));
            }
            id
        }
        None => new_node_id(),
    };

    let parent = match draft.parent_id.as_deref() {
        Some(pid) => Some(
            find_node_by_id(forest, pid)
                .ok_or_else(|| TaxonomyError::ParentNotFound(pid.to_string()))?,
        ),
        None => None,
    };
    check_placement(draft.node_type, parent.map(|p| p.node_type))?;
    if let Some(p) = parent {
        if !p.is_active {
            return Err(TaxonomyError::InactiveAncestor(p.id.clone()));
        }
    }

    let proficiency_levels = match draft.proficiency_levels {
        Some(levels) => {
            if draft.node_type != NodeType::Skill {
                return Err(TaxonomyError::InvalidProficiency(format!(
                    "only skills carry proficiency levels, got a {}",
                    draft.node_type
                )));
            }
            validate_levels(&levels)?;
            Some(sorted_levels(levels))
        }
        None => None,
    };

    let mut new_forest = forest.clone();
    let siblings = match draft.parent_id.as_deref() {
        Some(pid) => {
            &mut find_node_mut(&mut new_forest.roots, pid)
                .ok_or_else(|| TaxonomyError::ParentNotFound(pid.to_string()))?
                .children
        }
        None => &mut new_forest.roots,
    };

    let node = TaxonomyNode {
        id: id.clone(),
        name: name.to_string(),
        description: normalize_description(draft.description),
        node_type: draft.node_type,
        parent_id: draft.parent_id,
        rank: draft.rank.unwrap_or(siblings.len() as i64 + 1),
        is_active: true,
        children: Vec::new(),
        proficiency_levels,
        usage: draft.usage.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };
    siblings.push(node);

    Ok((new_forest, id))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Merge the `Some` fields of `patch` over node `patch.id` and refresh
/// `updated_at`. Every other node is left untouched.
pub fn update_node(
    forest: &Forest,
    patch: NodePatch,
    now: DateTime<Utc>,
) -> Result<Forest, TaxonomyError> {
    let mut new_forest = forest.clone();
    let node = find_node_mut(&mut new_forest.roots, &patch.id)
        .ok_or_else(|| TaxonomyError::NodeNotFound(patch.id.clone()))?;

    if let Some(requested) = patch.node_type {
        if requested != node.node_type {
            return Err(TaxonomyError::InvalidType {
                id: node.id.clone(),
                current: node.node_type,
                requested,
            });
        }
    }

    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(TaxonomyError::InvalidName);
        }
        node.name = name.to_string();
    }
    if let Some(description) = patch.description {
        node.description = normalize_description(Some(description));
    }
    if let Some(rank) = patch.rank {
        node.rank = rank;
    }
    if let Some(usage) = patch.usage {
        node.usage = usage;
    }

    node.touch(now);
    Ok(new_forest)
}

// ---------------------------------------------------------------------------
// Move (re-parent)
// ---------------------------------------------------------------------------

/// Detach node `id` with its subtree and append it under `new_parent_id`
/// (or at the root). Level rules apply as on insert.
pub fn move_node(
    forest: &Forest,
    id: &str,
    new_parent_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Forest, TaxonomyError> {
    let node = find_node_by_id(forest, id)
        .ok_or_else(|| TaxonomyError::NodeNotFound(id.to_string()))?;

    let new_parent = match new_parent_id {
        Some(pid) => Some(
            find_node_by_id(forest, pid)
                .ok_or_else(|| TaxonomyError::ParentNotFound(pid.to_string()))?,
        ),
        None => None,
    };
    check_placement(node.node_type, new_parent.map(|p| p.node_type))?;

    if let Some(p) = new_parent {
        let inside_subtree =
            p.id == node.id || collect_descendants(node).iter().any(|d| d.id == p.id);
        if inside_subtree {
            return Err(TaxonomyError::InvalidPlacement {
                child: node.node_type,
                parent: Some(p.node_type),
            });
        }
        let parent_inactive =
            !p.is_active || ancestors_of(forest, &p.id).iter().any(|a| !a.is_active);
        if node.is_active && parent_inactive {
            return Err(TaxonomyError::InactiveAncestor(p.id.clone()));
        }
    }

    let mut new_forest = forest.clone();
    let mut moved = detach(&mut new_forest.roots, id)
        .ok_or_else(|| TaxonomyError::NodeNotFound(id.to_string()))?;

    let siblings = match new_parent_id {
        Some(pid) => {
            &mut find_node_mut(&mut new_forest.roots, pid)
                .ok_or_else(|| TaxonomyError::ParentNotFound(pid.to_string()))?
                .children
        }
        None => &mut new_forest.roots,
    };
    moved.parent_id = new_parent_id.map(str::to_string);
    moved.rank = siblings.len() as i64 + 1;
    moved.touch(now);
    siblings.push(moved);

    Ok(new_forest)
}

// ---------------------------------------------------------------------------
// Inactivate / restore
// ---------------------------------------------------------------------------

/// Soft-delete `target_id` and every descendant.
///
/// Nodes stay where they are; only `is_active` and `updated_at` change.
/// Returns the new forest and the affected nodes as they were before the
/// flip, target first then descendants in pre-order, children cleared.
/// Already inactive nodes stay inactive and get `updated_at` refreshed too.
pub fn inactivate_subtree(
    forest: &Forest,
    target_id: &str,
    now: DateTime<Utc>,
) -> Result<(Forest, Vec<TaxonomyNode>), TaxonomyError> {
    set_subtree_active(forest, target_id, false, now)
}

/// Reverse of `inactivate_subtree`. Fails with `InactiveAncestor` while any
/// ancestor of the target is still inactive.
pub fn restore_subtree(
    forest: &Forest,
    target_id: &str,
    now: DateTime<Utc>,
) -> Result<(Forest, Vec<TaxonomyNode>), TaxonomyError> {
    if let Some(inactive) = ancestors_of(forest, target_id)
        .into_iter()
        .find(|a| !a.is_active)
    {
        return Err(TaxonomyError::InactiveAncestor(inactive.id.clone()));
    }
    set_subtree_active(forest, target_id, true, now)
}

fn set_subtree_active(
    forest: &Forest,
    target_id: &str,
    active: bool,
    now: DateTime<Utc>,
) -> Result<(Forest, Vec<TaxonomyNode>), TaxonomyError> {
    let target = find_node_by_id(forest, target_id)
        .ok_or_else(|| TaxonomyError::NodeNotFound(target_id.to_string()))?;

    let affected: Vec<TaxonomyNode> = std::iter::once(target)
        .chain(collect_descendants(target))
        .map(flat_copy)
        .collect();

    let mut new_forest = forest.clone();
    let root = find_node_mut(&mut new_forest.roots, target_id)
        .ok_or_else(|| TaxonomyError::NodeNotFound(target_id.to_string()))?;
    apply_active(root, active, now);

    Ok((new_forest, affected))
}

fn apply_active(node: &mut TaxonomyNode, active: bool, now: DateTime<Utc>) {
    node.is_active = active;
    node.touch(now);
    for child in &mut node.children {
        apply_active(child, active, now);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Enforce cluster -> group -> skill placement.
pub fn check_placement(child: NodeType, parent: Option<NodeType>) -> Result<(), TaxonomyError> {
    if child.parent_type() == parent {
        Ok(())
    } else {
        Err(TaxonomyError::InvalidPlacement { child, parent })
    }
}

fn detach(nodes: &mut Vec<TaxonomyNode>, id: &str) -> Option<TaxonomyNode> {
    if let Some(pos) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.remove(pos));
    }
    nodes.iter_mut().find_map(|n| detach(&mut n.children, id))
}

fn flat_copy(node: &TaxonomyNode) -> TaxonomyNode {
    TaxonomyNode {
        id: node.id.clone(),
        name: node.name.clone(),
        description: node.description.clone(),
        node_type: node.node_type,
        parent_id: node.parent_id.clone(),
        rank: node.rank,
        is_active: node.is_active,
        children: Vec::new(),
        proficiency_levels: node.proficiency_levels.clone(),
        usage: node.usage,
        created_at: node.created_at,
        updated_at: node.updated_at,
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
