/// Taxonomy Kernel: Error Types
///
/// Every failure is local, synchronous and recoverable. Callers decide
/// whether to surface an error or ignore it.

use thiserror::Error;

use crate::domain::NodeType;
use crate::ids::NodeId;
use crate::invariants::InvariantViolation;

/// Failures of the pure forest operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("parent node {0:?} does not exist")]
    ParentNotFound(NodeId),

    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),

    #[error("node id {0:?} already exists")]
    DuplicateId(NodeId),

    #[error("invalid node id {0:?}: must match [A-Za-z0-9_-]+")]
    InvalidId(String),

    #[error("node name must not be empty")]
    InvalidName,

    #[error("node {id:?} is a {current}; its type cannot change to {requested}")]
    InvalidType {
        id: NodeId,
        current: NodeType,
        requested: NodeType,
    },

    #[error("a {child} cannot be placed under {}", placement_label(.parent))]
    InvalidPlacement {
        child: NodeType,
        parent: Option<NodeType>,
    },

    #[error("node {0:?} has an inactive ancestor; restore the ancestor first")]
    InactiveAncestor(NodeId),

    #[error("invalid proficiency levels: {0}")]
    InvalidProficiency(String),
}

fn placement_label(parent: &Option<NodeType>) -> String {
    match parent {
        Some(p) => format!("a {}", p),
        None => "the forest root".to_string(),
    }
}

/// Failures of the relationship and role-mapping registries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("required field {0:?} is missing")]
    MissingField(&'static str),

    #[error("duplicate entry: {0}")]
    Duplicate(String),

    #[error("record {0:?} does not exist")]
    NotFound(String),

    #[error("skill {0:?} cannot be related to itself")]
    SelfRelation(NodeId),

    #[error("{0:?} is not a skill in the taxonomy")]
    UnknownSkill(String),

    #[error("skill {0:?} is inactive")]
    InactiveSkill(NodeId),

    #[error("skill {skill_id:?} has no proficiency level {level:?}")]
    UnknownLevel { skill_id: NodeId, level: String },
}

/// Failures of the command-applying engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaVersion { expected: u32, got: u32 },

    #[error("sequence violation: expected {expected}, got {got}")]
    Sequence { expected: u64, got: u64 },

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
