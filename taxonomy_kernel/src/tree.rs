/// Taxonomy Kernel: Tree Queries
///
/// Read-only traversal over the forest. Pre-order everywhere.
/// Ids are assumed globally unique, so first match wins.

use crate::domain::{Forest, ImpactSummary, NodeType, PreOrder, TaxonomyNode};

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Depth-first search for the node with `id`. O(n).
pub fn find_node_by_id<'a>(forest: &'a Forest, id: &str) -> Option<&'a TaxonomyNode> {
    forest.iter().find(|n| n.id == id)
}

/// Mutable counterpart of `find_node_by_id`, recursive descent.
pub(crate) fn find_node_mut<'a>(
    nodes: &'a mut [TaxonomyNode],
    id: &str,
) -> Option<&'a mut TaxonomyNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Case-insensitive lookup of an active skill by display name.
pub fn find_skill_by_name<'a>(forest: &'a Forest, name: &str) -> Option<&'a TaxonomyNode> {
    let wanted = name.trim();
    forest.iter().find(|n| {
        n.node_type == NodeType::Skill && n.is_active && n.name.trim().eq_ignore_ascii_case(wanted)
    })
}

/// True if any node carries `id`.
pub fn contains_id(forest: &Forest, id: &str) -> bool {
    find_node_by_id(forest, id).is_some()
}

// ---------------------------------------------------------------------------
// Descendants and ancestors
// ---------------------------------------------------------------------------

/// All nodes strictly beneath `node`, pre-order, flattened.
pub fn collect_descendants(node: &TaxonomyNode) -> Vec<&TaxonomyNode> {
    PreOrder::new(&node.children).collect()
}

/// Ancestors of `id`, nearest first. Empty for roots and unknown ids.
pub fn ancestors_of<'a>(forest: &'a Forest, id: &str) -> Vec<&'a TaxonomyNode> {
    let mut chain = Vec::new();
    let mut current = find_node_by_id(forest, id).and_then(|n| n.parent_id.as_deref());
    while let Some(pid) = current {
        match find_node_by_id(forest, pid) {
            Some(parent) => {
                chain.push(parent);
                current = parent.parent_id.as_deref();
            }
            None => break,
        }
    }
    chain
}

// ---------------------------------------------------------------------------
// Impact analysis
// ---------------------------------------------------------------------------

/// Count what an inactivation of `node` would touch, the node included.
pub fn impact_of(node: &TaxonomyNode) -> ImpactSummary {
    let mut summary = ImpactSummary::default();
    for n in std::iter::once(node).chain(collect_descendants(node)) {
        match n.node_type {
            NodeType::Cluster => summary.clusters += 1,
            NodeType::Group => summary.groups += 1,
            NodeType::Skill => summary.skills += 1,
        }
        summary.usage = summary.usage.saturating_add(&n.usage);
    }
    summary
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Copy of the forest with every inactive subtree pruned, for rendering.
pub fn active_view(forest: &Forest) -> Forest {
    fn prune(nodes: &[TaxonomyNode]) -> Vec<TaxonomyNode> {
        nodes
            .iter()
            .filter(|n| n.is_active)
            .map(|n| TaxonomyNode {
                children: prune(&n.children),
                ..n.clone()
            })
            .collect()
    }
    Forest::from_roots(prune(&forest.roots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UsageCounters;
    use chrono::{TimeZone, Utc};

    fn node(id: &str, t: NodeType, parent: Option<&str>, children: Vec<TaxonomyNode>) -> TaxonomyNode {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TaxonomyNode {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            node_type: t,
            parent_id: parent.map(str::to_string),
            rank: 1,
            is_active: true,
            children,
            proficiency_levels: None,
            usage: UsageCounters {
                usage_count: 1,
                ..Default::default()
            },
            created_at: at,
            updated_at: at,
        }
    }

    fn forest() -> Forest {
        let s1 = node("S1", NodeType::Skill, Some("G1"), vec![]);
        let s2 = node("S2", NodeType::Skill, Some("G1"), vec![]);
        let g1 = node("G1", NodeType::Group, Some("C1"), vec![s1, s2]);
        let g2 = node("G2", NodeType::Group, Some("C1"), vec![]);
        let c1 = node("C1", NodeType::Cluster, None, vec![g1, g2]);
        let c2 = node("C2", NodeType::Cluster, None, vec![]);
        Forest::from_roots(vec![c1, c2])
    }

    #[test]
    fn preorder_visits_parents_before_children() {
        let f = forest();
        let ids: Vec<&str> = f.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "G1", "S1", "S2", "G2", "C2"]);
    }

    #[test]
    fn descendants_are_strict_and_flat() {
        let f = forest();
        let c1 = find_node_by_id(&f, "C1").unwrap();
        let ids: Vec<&str> = collect_descendants(c1).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["G1", "S1", "S2", "G2"]);
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let f = forest();
        let ids: Vec<&str> = ancestors_of(&f, "S2").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["G1", "C1"]);
        assert!(ancestors_of(&f, "C2").is_empty());
        assert!(ancestors_of(&f, "nope").is_empty());
    }

    #[test]
    fn impact_counts_each_level() {
        let f = forest();
        let impact = impact_of(find_node_by_id(&f, "C1").unwrap());
        assert_eq!(impact.clusters, 1);
        assert_eq!(impact.groups, 2);
        assert_eq!(impact.skills, 2);
        assert_eq!(impact.usage.usage_count, 5);
        assert_eq!(impact.total_nodes(), 5);
    }

    #[test]
    fn active_view_prunes_inactive_subtrees() {
        let mut f = forest();
        find_node_mut(&mut f.roots, "G1").unwrap().is_active = false;
        let view = active_view(&f);
        assert!(find_node_by_id(&view, "G1").is_none());
        assert!(find_node_by_id(&view, "S1").is_none());
        assert!(find_node_by_id(&view, "G2").is_some());
        assert_eq!(view.node_count(), 3);
    }

    #[test]
    fn skill_name_lookup_ignores_case() {
        let f = forest();
        assert_eq!(find_skill_by_name(&f, " s2 ").map(|n| n.id.as_str()), Some("S2"));
        assert!(find_skill_by_name(&f, "G1").is_none());
    }
}
