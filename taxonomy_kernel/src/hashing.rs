/// Taxonomy Kernel: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
///
/// Rules:
///   - Nodes in forest order (sibling order is meaningful)
///   - Node fields in fixed order, nested children inline
///   - Timestamps as RFC 3339, UTC, microsecond precision
///   - UTF-8 JSON, no whitespace, no float

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{Forest, ProficiencyLevel, TaxonomyNode, UsageCounters};
use crate::KERNEL_VERSION;

/// Canonical serialization of a forest to UTF-8 JSON bytes.
/// `kernel_version` is the first field.
pub fn canonical_serialize(forest: &Forest) -> Vec<u8> {
    let mut root = Map::new();
    root.insert(
        "kernel_version".to_string(),
        Value::Number(KERNEL_VERSION.into()),
    );
    root.insert(
        "roots".to_string(),
        Value::Array(forest.roots.iter().map(canonical_node).collect()),
    );
    Value::Object(root).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash(forest: &Forest) -> String {
    hex_digest(&canonical_serialize(forest))
}

/// SHA-256 of arbitrary bytes as lowercase hex.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn canonical_node(node: &TaxonomyNode) -> Value {
    let mut m = Map::new();
    m.insert("id".to_string(), Value::String(node.id.clone()));
    m.insert("name".to_string(), Value::String(node.name.clone()));
    m.insert("description".to_string(), opt_string(&node.description));
    m.insert(
        "type".to_string(),
        Value::String(node.node_type.as_str().to_string()),
    );
    m.insert("parent_id".to_string(), opt_string(&node.parent_id));
    m.insert("rank".to_string(), Value::Number(node.rank.into()));
    m.insert("is_active".to_string(), Value::Bool(node.is_active));
    m.insert(
        "proficiency_levels".to_string(),
        match &node.proficiency_levels {
            Some(levels) => Value::Array(levels.iter().map(canonical_level).collect()),
            None => Value::Null,
        },
    );
    m.insert("usage".to_string(), canonical_usage(&node.usage));
    m.insert("created_at".to_string(), timestamp(&node.created_at));
    m.insert("updated_at".to_string(), timestamp(&node.updated_at));
    m.insert(
        "children".to_string(),
        Value::Array(node.children.iter().map(canonical_node).collect()),
    );
    Value::Object(m)
}

fn canonical_level(level: &ProficiencyLevel) -> Value {
    let mut m = Map::new();
    m.insert("id".to_string(), Value::String(level.id.clone()));
    m.insert("title".to_string(), Value::String(level.title.clone()));
    m.insert(
        "description".to_string(),
        Value::String(level.description.clone()),
    );
    m.insert("min_score".to_string(), Value::Number(level.min_score.into()));
    m.insert("max_score".to_string(), Value::Number(level.max_score.into()));
    m.insert("order".to_string(), Value::Number(level.order.into()));
    Value::Object(m)
}

fn canonical_usage(usage: &UsageCounters) -> Value {
    let mut m = Map::new();
    m.insert("usage_count".to_string(), Value::Number(usage.usage_count.into()));
    m.insert(
        "employee_count".to_string(),
        Value::Number(usage.employee_count.into()),
    );
    m.insert("course_count".to_string(), Value::Number(usage.course_count.into()));
    m.insert("role_count".to_string(), Value::Number(usage.role_count.into()));
    Value::Object(m)
}

fn opt_string(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}

fn timestamp(at: &DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}
