//! Snapshot codec: deterministic encoder/decoder for console state.
//!
//! Pure codec layer. No file I/O.
//!
//! - `encode_snapshot`:  ConsoleSnapshot -> JSON string
//! - `decode_snapshot`:  JSON string -> ConsoleSnapshot (strict)
//! - `restore_snapshot`: decode + validation against the forest
//! - `snapshot_hash`:    SHA-256 of the encoded JSON (lowercase hex)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taxonomy_kernel::domain::{Forest, NodeType};
use taxonomy_kernel::error::EngineError;
use taxonomy_kernel::hashing::hex_digest;
use taxonomy_kernel::inactive::InactiveBin;
use taxonomy_kernel::invariants::{try_validate_invariants, InvariantViolation};
use taxonomy_kernel::relationships::SkillRelationshipRegistry;
use taxonomy_kernel::role_mapping::RoleSkillRegistry;
use taxonomy_kernel::tree::find_node_by_id;
use taxonomy_kernel::KERNEL_VERSION;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("snapshot decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("snapshot kernel version {got}, expected {expected}")]
    KernelVersion { expected: u32, got: u32 },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("snapshot references unknown or unsuitable node: {0}")]
    DanglingReference(String),

    #[error("snapshot could not seed an engine: {0}")]
    Engine(#[from] EngineError),
}

/// Everything a console session holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleSnapshot {
    pub kernel_version: u32,
    pub forest: Forest,
    pub inactive: InactiveBin,
    pub relationships: SkillRelationshipRegistry,
    pub role_skills: RoleSkillRegistry,
}

impl ConsoleSnapshot {
    pub fn new(
        forest: Forest,
        inactive: InactiveBin,
        relationships: SkillRelationshipRegistry,
        role_skills: RoleSkillRegistry,
    ) -> Self {
        Self {
            kernel_version: KERNEL_VERSION,
            forest,
            inactive,
            relationships,
            role_skills,
        }
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Compact JSON; field order follows the struct definitions.
pub fn encode_snapshot(snapshot: &ConsoleSnapshot) -> Result<String, SnapshotError> {
    serde_json::to_string(snapshot).map_err(SnapshotError::Encode)
}

/// Unknown fields and missing required fields both fail.
/// No validation; see `restore_snapshot`.
pub fn decode_snapshot(json: &str) -> Result<ConsoleSnapshot, SnapshotError> {
    serde_json::from_str(json).map_err(SnapshotError::Decode)
}

/// Decode and validate. The entry point for untrusted input.
pub fn restore_snapshot(json: &str) -> Result<ConsoleSnapshot, SnapshotError> {
    let snapshot = decode_snapshot(json)?;
    if snapshot.kernel_version != KERNEL_VERSION {
        return Err(SnapshotError::KernelVersion {
            expected: KERNEL_VERSION,
            got: snapshot.kernel_version,
        });
    }
    try_validate_invariants(&snapshot.forest)?;
    check_references(&snapshot)?;
    Ok(snapshot)
}

/// SHA-256 of `encode_snapshot`'s output.
pub fn snapshot_hash(snapshot: &ConsoleSnapshot) -> Result<String, SnapshotError> {
    Ok(hex_digest(encode_snapshot(snapshot)?.as_bytes()))
}

/// Bin entries must name inactive nodes; registry entries must name skills.
fn check_references(snapshot: &ConsoleSnapshot) -> Result<(), SnapshotError> {
    let forest = &snapshot.forest;
    for item in snapshot.inactive.items() {
        match find_node_by_id(forest, &item.id) {
            Some(node) if !node.is_active => {}
            _ => {
                return Err(SnapshotError::DanglingReference(format!(
                    "inactive item {}",
                    item.id
                )))
            }
        }
    }

    let is_skill = |id: &str| {
        find_node_by_id(forest, id).is_some_and(|n| n.node_type == NodeType::Skill)
    };
    for rel in snapshot.relationships.list() {
        if !is_skill(&rel.skill_id) || !is_skill(&rel.related_skill_id) {
            return Err(SnapshotError::DanglingReference(format!(
                "relationship {}",
                rel.id
            )));
        }
    }
    for mapping in snapshot.role_skills.list() {
        if !is_skill(&mapping.skill_id) {
            return Err(SnapshotError::DanglingReference(format!(
                "role skill mapping {}",
                mapping.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
