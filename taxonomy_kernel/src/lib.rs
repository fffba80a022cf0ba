#![forbid(unsafe_code)]

//! Skills taxonomy kernel.
//!
//! An in-memory forest of clusters, groups and skills with pure,
//! copy-on-write operations, soft-delete cascade, invariant checks and
//! canonical hashing, plus the registries that hang off the taxonomy.

/// Kernel v1. Bumped only when canonical hashing or command semantics change.
pub const KERNEL_VERSION: u32 = 1;

pub mod ids;
pub mod error;
pub mod domain;
pub mod commands;
pub mod tree;
pub mod operations;
pub mod proficiency;
pub mod invariants;
pub mod hashing;
pub mod inactive;
pub mod engine;
pub mod relationships;
pub mod role_mapping;
pub mod seed;
