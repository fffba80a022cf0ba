/// Taxonomy Kernel: Command Definitions
///
/// Commands are pure data. They carry intent and payload only.
/// Schema version is locked at 1; the engine rejects anything else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{NodeDraft, NodePatch, ProficiencyLevel};
use crate::ids::NodeId;

/// Schema version for v1 commands.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A single intended mutation of the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    InsertNode {
        draft: NodeDraft,
    },
    UpdateNode {
        patch: NodePatch,
    },
    MoveNode {
        node_id: NodeId,
        #[serde(default)]
        new_parent_id: Option<NodeId>,
    },
    InactivateSubtree {
        target_id: NodeId,
        #[serde(default)]
        actor: Option<String>,
    },
    RestoreSubtree {
        target_id: NodeId,
    },
    SetProficiencyLevels {
        skill_id: NodeId,
        levels: Vec<ProficiencyLevel>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::InsertNode { .. } => "insert_node",
            Command::UpdateNode { .. } => "update_node",
            Command::MoveNode { .. } => "move_node",
            Command::InactivateSubtree { .. } => "inactivate_subtree",
            Command::RestoreSubtree { .. } => "restore_subtree",
            Command::SetProficiencyLevels { .. } => "set_proficiency_levels",
        }
    }

    /// The id of the node the command is aimed at, when it names one.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Command::InsertNode { draft } => draft.id.as_deref(),
            Command::UpdateNode { patch } => Some(&patch.id),
            Command::MoveNode { node_id, .. } => Some(node_id),
            Command::InactivateSubtree { target_id, .. } => Some(target_id),
            Command::RestoreSubtree { target_id } => Some(target_id),
            Command::SetProficiencyLevels { skill_id, .. } => Some(skill_id),
        }
    }
}

/// Sequenced, timestamped command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub sequence: u64,
    pub issued_at: DateTime<Utc>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub command: Command,
}

impl CommandEnvelope {
    pub fn new(sequence: u64, issued_at: DateTime<Utc>, command: Command) -> Self {
        Self {
            sequence,
            issued_at,
            schema_version: SCHEMA_VERSION,
            command,
        }
    }
}

/// What an applied command did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub command: String,
    pub sequence: u64,
    /// Node created by an insert, or the node the command targeted.
    pub node_id: Option<NodeId>,
    /// Every node the command wrote to, target first.
    pub affected: Vec<NodeId>,
}
