//! Console session: the single owner of the taxonomy engine (and with it
//! the inactive bin) plus the side registries.
//!
//! Lifecycle:
//!   1. `open` / `open_with_forest` / `open_from_snapshot` initialise state
//!   2. mutations go through the session (`&mut self`, no locks)
//!   3. `close` tears the session down and returns a summary

use chrono::{DateTime, Utc};
use tracing::info;

use taxonomy_kernel::commands::{CommandEnvelope, CommandOutcome};
use taxonomy_kernel::domain::{
    Forest, ImpactSummary, InactiveItem, NodeDraft, NodePatch, ProficiencyLevel,
};
use taxonomy_kernel::engine::TaxonomyEngine;
use taxonomy_kernel::error::{CatalogError, EngineError};
use taxonomy_kernel::hashing::canonical_hash;
use taxonomy_kernel::ids::NodeId;
use taxonomy_kernel::inactive::InactiveBin;
use taxonomy_kernel::relationships::{SkillRelationship, SkillRelationshipRegistry};
use taxonomy_kernel::role_mapping::{
    Criticality, MappingTarget, RoleSkillMapping, RoleSkillRegistry,
};
use taxonomy_kernel::tree::{find_node_by_id, impact_of};

use crate::config::ConsoleConfig;
use crate::import::{self, ImportReport, RelationshipRow, RoleSkillRow};
use crate::snapshot_codec::{restore_snapshot, ConsoleSnapshot, SnapshotError};

/// Final figures reported when a session closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub last_sequence: u64,
    pub node_count: usize,
    pub active_count: usize,
    pub inactive_items: usize,
    pub relationships: usize,
    pub role_skill_mappings: usize,
    pub canonical_hash: String,
}

pub struct ConsoleSession {
    session_id: String,
    config: ConsoleConfig,
    engine: TaxonomyEngine,
    relationships: SkillRelationshipRegistry,
    role_skills: RoleSkillRegistry,
}

impl ConsoleSession {
    /// Start with an empty forest and an empty bin.
    pub fn open(session_id: &str, config: ConsoleConfig) -> Self {
        let engine = TaxonomyEngine::with_policy(config.engine_policy());
        info!(session_id, "session.open");
        Self {
            session_id: session_id.to_string(),
            config,
            engine,
            relationships: SkillRelationshipRegistry::new(),
            role_skills: RoleSkillRegistry::new(),
        }
    }

    /// Start from an existing forest, validated before use.
    pub fn open_with_forest(
        session_id: &str,
        config: ConsoleConfig,
        forest: Forest,
    ) -> Result<Self, EngineError> {
        let engine = TaxonomyEngine::from_forest(forest, InactiveBin::new(), config.engine_policy())?;
        info!(session_id, nodes = engine.forest().node_count(), "session.open");
        Ok(Self {
            session_id: session_id.to_string(),
            config,
            engine,
            relationships: SkillRelationshipRegistry::new(),
            role_skills: RoleSkillRegistry::new(),
        })
    }

    /// Start from an encoded `ConsoleSnapshot`.
    pub fn open_from_snapshot(
        session_id: &str,
        config: ConsoleConfig,
        json: &str,
    ) -> Result<Self, SnapshotError> {
        let snapshot = restore_snapshot(json)?;
        let engine =
            TaxonomyEngine::from_forest(snapshot.forest, snapshot.inactive, config.engine_policy())?;
        info!(
            session_id,
            nodes = engine.forest().node_count(),
            inactive = engine.inactive().len(),
            "session.open"
        );
        Ok(Self {
            session_id: session_id.to_string(),
            config,
            engine,
            relationships: snapshot.relationships,
            role_skills: snapshot.role_skills,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn forest(&self) -> &Forest {
        self.engine.forest()
    }

    pub fn inactive(&self) -> &InactiveBin {
        self.engine.inactive()
    }

    pub fn relationships(&self) -> &SkillRelationshipRegistry {
        &self.relationships
    }

    pub fn role_skills(&self) -> &RoleSkillRegistry {
        &self.role_skills
    }

    /// Resolved command log, replayable with `replay::rebuild_forest`.
    pub fn history(&self) -> &[CommandEnvelope] {
        self.engine.history()
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(self.engine.forest())
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    // ── Taxonomy ────────────────────────────────────────────────────

    pub fn apply(&mut self, envelope: &CommandEnvelope) -> Result<CommandOutcome, EngineError> {
        self.engine.apply(envelope)
    }

    pub fn insert(&mut self, draft: NodeDraft) -> Result<NodeId, EngineError> {
        self.engine.insert(draft)
    }

    pub fn update(&mut self, patch: NodePatch) -> Result<CommandOutcome, EngineError> {
        self.engine.update(patch)
    }

    pub fn move_node(
        &mut self,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<CommandOutcome, EngineError> {
        self.engine.move_to(node_id, new_parent_id)
    }

    /// Cascade-inactivate; `actor` falls back to the configured default.
    pub fn inactivate(
        &mut self,
        target_id: &str,
        actor: Option<&str>,
    ) -> Result<CommandOutcome, EngineError> {
        self.engine.inactivate(target_id, actor)
    }

    pub fn restore(&mut self, target_id: &str) -> Result<CommandOutcome, EngineError> {
        self.engine.restore(target_id)
    }

    pub fn set_levels(
        &mut self,
        skill_id: &str,
        levels: Vec<ProficiencyLevel>,
    ) -> Result<CommandOutcome, EngineError> {
        self.engine.set_levels(skill_id, levels)
    }

    /// What an inactivation of `node_id` would touch.
    pub fn impact(&self, node_id: &str) -> Option<ImpactSummary> {
        find_node_by_id(self.engine.forest(), node_id).map(impact_of)
    }

    // ── Inactive bin ────────────────────────────────────────────────

    /// Bin records past the configured retention window.
    pub fn expired_items(&self, now: DateTime<Utc>) -> Vec<&InactiveItem> {
        self.engine.inactive().expired(now, self.config.retention())
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<InactiveItem> {
        self.engine.purge_expired(now, self.config.retention())
    }

    // ── Registries ──────────────────────────────────────────────────

    pub fn relate_skills(
        &mut self,
        skill_id: &str,
        related_skill_id: &str,
    ) -> Result<SkillRelationship, CatalogError> {
        let rel = self
            .relationships
            .add(self.engine.forest(), skill_id, related_skill_id)?
            .clone();
        info!(id = %rel.id, skill_id, related_skill_id, "relationship.add");
        Ok(rel)
    }

    pub fn unrelate_skills(&mut self, id: &str) -> Result<SkillRelationship, CatalogError> {
        let rel = self.relationships.remove(id)?;
        info!(id, "relationship.remove");
        Ok(rel)
    }

    pub fn map_skill(
        &mut self,
        target: MappingTarget,
        skill_id: &str,
        proficiency_level: &str,
        criticality: Criticality,
    ) -> Result<RoleSkillMapping, CatalogError> {
        let mapping = self
            .role_skills
            .add(self.engine.forest(), target, skill_id, proficiency_level, criticality)?
            .clone();
        info!(id = %mapping.id, skill_id, target = %mapping.target.name, "role_skill.add");
        Ok(mapping)
    }

    pub fn update_mapping(
        &mut self,
        id: &str,
        proficiency_level: Option<&str>,
        criticality: Option<Criticality>,
    ) -> Result<RoleSkillMapping, CatalogError> {
        let mapping = self
            .role_skills
            .update(self.engine.forest(), id, proficiency_level, criticality)?
            .clone();
        info!(id, "role_skill.update");
        Ok(mapping)
    }

    pub fn unmap_skill(&mut self, id: &str) -> Result<RoleSkillMapping, CatalogError> {
        let mapping = self.role_skills.remove(id)?;
        info!(id, "role_skill.remove");
        Ok(mapping)
    }

    pub fn import_relationships(&mut self, rows: &[RelationshipRow]) -> ImportReport {
        import::import_relationships(self.engine.forest(), &mut self.relationships, rows)
    }

    pub fn import_role_skills(&mut self, rows: &[RoleSkillRow]) -> ImportReport {
        import::import_role_skills(self.engine.forest(), &mut self.role_skills, rows)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    pub fn snapshot(&self) -> ConsoleSnapshot {
        ConsoleSnapshot::new(
            self.engine.forest().clone(),
            self.engine.inactive().clone(),
            self.relationships.clone(),
            self.role_skills.clone(),
        )
    }

    /// Tear down the session. All in-memory state is dropped.
    pub fn close(self) -> SessionSummary {
        let forest = self.engine.forest();
        let summary = SessionSummary {
            session_id: self.session_id.clone(),
            last_sequence: self.engine.last_sequence(),
            node_count: forest.node_count(),
            active_count: forest.active_count(),
            inactive_items: self.engine.inactive().len(),
            relationships: self.relationships.len(),
            role_skill_mappings: self.role_skills.len(),
            canonical_hash: canonical_hash(forest),
        };
        info!(
            session_id = %summary.session_id,
            last_sequence = summary.last_sequence,
            nodes = summary.node_count,
            "session.close"
        );
        summary
    }
}
