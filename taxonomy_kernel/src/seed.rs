/// Taxonomy Kernel: Sample Taxonomy
///
/// A small, valid forest used by demos and tests.

use chrono::{DateTime, Utc};

use crate::domain::{Forest, NodeType, TaxonomyNode, UsageCounters};
use crate::proficiency::default_proficiency_levels;

/// Technology and Leadership clusters with a handful of skills.
/// Every skill carries the default proficiency levels.
pub fn sample_forest(at: DateTime<Utc>) -> Forest {
    let node = |id: &str,
                name: &str,
                node_type: NodeType,
                parent: Option<&str>,
                rank: i64,
                usage: u64,
                children: Vec<TaxonomyNode>| TaxonomyNode {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        node_type,
        parent_id: parent.map(str::to_string),
        rank,
        is_active: true,
        children,
        proficiency_levels: (node_type == NodeType::Skill).then(default_proficiency_levels),
        usage: UsageCounters {
            usage_count: usage,
            employee_count: usage / 2,
            course_count: usage / 10,
            role_count: usage / 20,
        },
        created_at: at,
        updated_at: at,
    };

    let programming = node(
        "group-programming",
        "Programming Languages",
        NodeType::Group,
        Some("cluster-technology"),
        1,
        0,
        vec![
            node("skill-rust", "Rust", NodeType::Skill, Some("group-programming"), 1, 120, vec![]),
            node("skill-kotlin", "Kotlin", NodeType::Skill, Some("group-programming"), 2, 80, vec![]),
            node("skill-typescript", "TypeScript", NodeType::Skill, Some("group-programming"), 3, 200, vec![]),
        ],
    );
    let cloud = node(
        "group-cloud",
        "Cloud Platforms",
        NodeType::Group,
        Some("cluster-technology"),
        2,
        0,
        vec![node("skill-aws", "AWS", NodeType::Skill, Some("group-cloud"), 1, 150, vec![])],
    );
    let technology = node(
        "cluster-technology",
        "Technology",
        NodeType::Cluster,
        None,
        1,
        0,
        vec![programming, cloud],
    );

    let people = node(
        "group-people",
        "People Management",
        NodeType::Group,
        Some("cluster-leadership"),
        1,
        0,
        vec![node("skill-coaching", "Coaching", NodeType::Skill, Some("group-people"), 1, 40, vec![])],
    );
    let leadership = node(
        "cluster-leadership",
        "Leadership",
        NodeType::Cluster,
        None,
        2,
        0,
        vec![people],
    );

    Forest::from_roots(vec![technology, leadership])
}
