/// Taxonomy Kernel: Core Domain Types
///
/// Pure data. No transition logic.
/// Hierarchy is strict: cluster -> group -> skill.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

// ── Node type ──────────────────────────────────────────────────────

/// Hierarchy level of a node. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Cluster,
    Group,
    Skill,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Cluster => "cluster",
            NodeType::Group => "group",
            NodeType::Skill => "skill",
        }
    }

    /// The type a parent of this node must have. `None` means root.
    pub fn parent_type(&self) -> Option<NodeType> {
        match self {
            NodeType::Cluster => None,
            NodeType::Group => Some(NodeType::Cluster),
            NodeType::Skill => Some(NodeType::Group),
        }
    }

    /// The type children of this node must have. `None` means leaf.
    pub fn child_type(&self) -> Option<NodeType> {
        match self {
            NodeType::Cluster => Some(NodeType::Group),
            NodeType::Group => Some(NodeType::Skill),
            NodeType::Skill => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Counters ───────────────────────────────────────────────────────

/// Informational aggregates. Caller-supplied, never recomputed here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageCounters {
    pub usage_count: u64,
    pub employee_count: u64,
    pub course_count: u64,
    pub role_count: u64,
}

impl UsageCounters {
    /// Field-wise saturating sum.
    pub fn saturating_add(&self, other: &UsageCounters) -> UsageCounters {
        UsageCounters {
            usage_count: self.usage_count.saturating_add(other.usage_count),
            employee_count: self.employee_count.saturating_add(other.employee_count),
            course_count: self.course_count.saturating_add(other.course_count),
            role_count: self.role_count.saturating_add(other.role_count),
        }
    }
}

// ── Proficiency ────────────────────────────────────────────────────

/// A named score band attached to a skill. Scores are 0..=100 inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProficiencyLevel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub min_score: u8,
    pub max_score: u8,
    pub order: u32,
}

// ── Node ───────────────────────────────────────────────────────────

/// A node of the taxonomy forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaxonomyNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub rank: i64,
    pub is_active: bool,
    #[serde(default)]
    pub children: Vec<TaxonomyNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency_levels: Option<Vec<ProficiencyLevel>>,
    #[serde(default)]
    pub usage: UsageCounters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaxonomyNode {
    /// Refresh `updated_at`, never moving it backwards.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
    }
}

/// The whole taxonomy: an ordered sequence of root clusters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Forest {
    pub roots: Vec<TaxonomyNode>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roots(roots: Vec<TaxonomyNode>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pre-order iterator over every node, active or not.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder::new(&self.roots)
    }

    /// Total node count across all levels.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Count of nodes with `is_active == true`.
    pub fn active_count(&self) -> usize {
        self.iter().filter(|n| n.is_active).count()
    }
}

/// Depth-first pre-order traversal with an explicit stack.
pub struct PreOrder<'a> {
    stack: Vec<&'a TaxonomyNode>,
}

impl<'a> PreOrder<'a> {
    pub fn new(nodes: &'a [TaxonomyNode]) -> Self {
        Self {
            stack: nodes.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TaxonomyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ── Inputs ─────────────────────────────────────────────────────────

/// Input to node creation. `name` and `node_type` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDraft {
    /// Caller-chosen id; a fresh one is minted when absent.
    #[serde(default)]
    pub id: Option<NodeId>,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub usage: Option<UsageCounters>,
    #[serde(default)]
    pub proficiency_levels: Option<Vec<ProficiencyLevel>>,
}

impl NodeDraft {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: None,
            name: name.into(),
            node_type,
            parent_id: None,
            description: None,
            rank: None,
            usage: None,
            proficiency_levels: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn under(mut self, parent_id: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_usage(mut self, usage: UsageCounters) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_levels(mut self, levels: Vec<ProficiencyLevel>) -> Self {
        self.proficiency_levels = Some(levels);
        self
    }
}

/// Partial update. `id` is required; each `Some` field overwrites.
///
/// An empty `description` clears it. `node_type` is accepted only when it
/// equals the current type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodePatch {
    pub id: NodeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub usage: Option<UsageCounters>,
}

impl NodePatch {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

// ── Audit ──────────────────────────────────────────────────────────

/// Flattened snapshot of a node taken when it was inactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InactiveItem {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Parent name at inactivation time, not kept live.
    #[serde(default)]
    pub parent_name: Option<String>,
    pub inactivated_at: DateTime<Utc>,
    pub inactivated_by: String,
    #[serde(default)]
    pub usage: UsageCounters,
}

/// Counts shown before a cascade is confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub clusters: usize,
    pub groups: usize,
    pub skills: usize,
    pub usage: UsageCounters,
}

impl ImpactSummary {
    pub fn total_nodes(&self) -> usize {
        self.clusters + self.groups + self.skills
    }
}
