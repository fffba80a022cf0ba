/// Taxonomy Kernel: Identifier Primitives
///
/// Node ids are opaque ASCII tokens matching `[A-Za-z0-9_-]+`.
/// Fresh ids are UUID v4 strings, which satisfy the same rule.

use uuid::Uuid;

use crate::error::TaxonomyError;

/// Identifier of a taxonomy node. Immutable once assigned.
pub type NodeId = String;

/// Upper bound on id length; UUIDs use 36.
pub const MAX_ID_LEN: usize = 128;

/// Mint a fresh node id.
pub fn new_node_id() -> NodeId {
    Uuid::new_v4().to_string()
}

/// Mint a fresh registry record id, e.g. `rel-3f2a...`.
pub fn new_record_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// True if `id` matches `[A-Za-z0-9_-]+` and fits `MAX_ID_LEN`.
pub fn is_valid_node_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// Validate a node id, returning `InvalidId` on mismatch.
pub fn validate_node_id(id: &str) -> Result<(), TaxonomyError> {
    if is_valid_node_id(id) {
        Ok(())
    } else {
        Err(TaxonomyError::InvalidId(id.to_string()))
    }
}
