/// Taxonomy Kernel: Engine
///
/// Stateful owner of the current forest and the inactive bin.
/// Delegates mutation to `operations`, validates via `invariants`, and
/// swaps the forest only when both succeed.
///
/// Strict sequence enforcement. Commands are recorded with every
/// generated value (ids, default levels, actor) resolved, so a replay of
/// `history()` rebuilds the same forest.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::commands::{Command, CommandEnvelope, CommandOutcome, SCHEMA_VERSION};
use crate::domain::{Forest, InactiveItem, NodeDraft, NodePatch, NodeType, ProficiencyLevel};
use crate::error::EngineError;
use crate::ids::{new_node_id, NodeId};
use crate::inactive::{inactive_items_from, InactiveBin};
use crate::invariants::try_validate_invariants;
use crate::operations::{inactivate_subtree, insert_node, move_node, restore_subtree, update_node};
use crate::proficiency::{default_proficiency_levels, set_proficiency_levels};

/// Knobs the hosting application sets once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePolicy {
    /// Give new skills the default levels when none are supplied.
    pub seed_default_levels: bool,
    /// Actor recorded on inactivations that name none.
    pub default_actor: String,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            seed_default_levels: true,
            default_actor: "admin".to_string(),
        }
    }
}

enum BinChange {
    Nothing,
    Record(Vec<InactiveItem>),
    Remove(Vec<NodeId>),
}

/// Command-applying store around the pure forest operations.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyEngine {
    forest: Forest,
    inactive: InactiveBin,
    last_sequence: u64,
    policy: EnginePolicy,
    history: Vec<CommandEnvelope>,
}

impl TaxonomyEngine {
    /// Create an engine with an empty forest and default policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: EnginePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Start from an existing forest, which must satisfy every invariant.
    pub fn from_forest(
        forest: Forest,
        inactive: InactiveBin,
        policy: EnginePolicy,
    ) -> Result<Self, EngineError> {
        try_validate_invariants(&forest)?;
        Ok(Self {
            forest,
            inactive,
            policy,
            ..Self::default()
        })
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn inactive(&self) -> &InactiveBin {
        &self.inactive
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Every applied command, resolved, in order.
    pub fn history(&self) -> &[CommandEnvelope] {
        &self.history
    }

    /// Apply a single command:
    ///   1. Validate schema version (must be 1)
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Resolve generated values
    ///   4. Delegate to the pure operation
    ///   5. Validate invariants on the new forest
    ///   6. Commit forest, bin and history
    pub fn apply(&mut self, envelope: &CommandEnvelope) -> Result<CommandOutcome, EngineError> {
        match self.apply_inner(envelope) {
            Ok(outcome) => {
                info!(
                    sequence = outcome.sequence,
                    command = %outcome.command,
                    node_id = ?outcome.node_id,
                    affected = outcome.affected.len(),
                    "taxonomy.command"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    sequence = envelope.sequence,
                    command = envelope.command.name(),
                    error = %err,
                    "taxonomy.command.rejected"
                );
                Err(err)
            }
        }
    }

    fn apply_inner(&mut self, envelope: &CommandEnvelope) -> Result<CommandOutcome, EngineError> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaVersion {
                expected: SCHEMA_VERSION,
                got: envelope.schema_version,
            });
        }

        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(EngineError::Sequence {
                expected,
                got: envelope.sequence,
            });
        }

        let command = self.resolve(&envelope.command);
        let at = envelope.issued_at;

        let (forest, node_id, affected, bin_change) = match &command {
            Command::InsertNode { draft } => {
                let (forest, id) = insert_node(&self.forest, draft.clone(), at)?;
                (forest, Some(id.clone()), vec![id], BinChange::Nothing)
            }
            Command::UpdateNode { patch } => {
                let forest = update_node(&self.forest, patch.clone(), at)?;
                (forest, Some(patch.id.clone()), vec![patch.id.clone()], BinChange::Nothing)
            }
            Command::MoveNode {
                node_id,
                new_parent_id,
            } => {
                let forest = move_node(&self.forest, node_id, new_parent_id.as_deref(), at)?;
                (forest, Some(node_id.clone()), vec![node_id.clone()], BinChange::Nothing)
            }
            Command::InactivateSubtree { target_id, actor } => {
                let (forest, affected) = inactivate_subtree(&self.forest, target_id, at)?;
                let actor = actor.as_deref().unwrap_or(&self.policy.default_actor);
                let items = inactive_items_from(&self.forest, &affected, actor, at);
                let ids = affected.into_iter().map(|n| n.id).collect();
                (forest, Some(target_id.clone()), ids, BinChange::Record(items))
            }
            Command::RestoreSubtree { target_id } => {
                let (forest, affected) = restore_subtree(&self.forest, target_id, at)?;
                let ids: Vec<NodeId> = affected.into_iter().map(|n| n.id).collect();
                (forest, Some(target_id.clone()), ids.clone(), BinChange::Remove(ids))
            }
            Command::SetProficiencyLevels { skill_id, levels } => {
                let forest = set_proficiency_levels(&self.forest, skill_id, levels.clone(), at)?;
                (forest, Some(skill_id.clone()), vec![skill_id.clone()], BinChange::Nothing)
            }
        };

        try_validate_invariants(&forest)?;

        self.forest = forest;
        match bin_change {
            BinChange::Nothing => {}
            BinChange::Record(items) => {
                let added = self.inactive.record(items);
                debug!(added, "inactive_bin.record");
            }
            BinChange::Remove(ids) => {
                let removed = self.inactive.remove(ids.iter().map(String::as_str));
                debug!(removed, "inactive_bin.remove");
            }
        }
        self.last_sequence = envelope.sequence;

        let outcome = CommandOutcome {
            command: command.name().to_string(),
            sequence: envelope.sequence,
            node_id,
            affected,
        };
        self.history.push(CommandEnvelope {
            command,
            ..envelope.clone()
        });
        Ok(outcome)
    }

    /// Fill in every value the engine generates so history replays exactly.
    fn resolve(&self, command: &Command) -> Command {
        match command {
            Command::InsertNode { draft } => {
                let mut draft = draft.clone();
                if draft.id.is_none() {
                    draft.id = Some(new_node_id());
                }
                if draft.node_type == NodeType::Skill
                    && draft.proficiency_levels.is_none()
                    && self.policy.seed_default_levels
                {
                    draft.proficiency_levels = Some(default_proficiency_levels());
                }
                Command::InsertNode { draft }
            }
            Command::InactivateSubtree {
                target_id,
                actor: None,
            } => Command::InactivateSubtree {
                target_id: target_id.clone(),
                actor: Some(self.policy.default_actor.clone()),
            },
            other => other.clone(),
        }
    }

    /// Apply an ordered sequence, stopping at the first failure.
    pub fn apply_sequence(&mut self, envelopes: &[CommandEnvelope]) -> Result<&Forest, EngineError> {
        for envelope in envelopes {
            self.apply(envelope)?;
        }
        Ok(&self.forest)
    }

    /// Reset to an empty forest and bin, then apply `envelopes`.
    pub fn replay(&mut self, envelopes: &[CommandEnvelope]) -> Result<&Forest, EngineError> {
        self.forest = Forest::new();
        self.inactive = InactiveBin::new();
        self.last_sequence = 0;
        self.history.clear();
        self.apply_sequence(envelopes)
    }

    // ── Convenience: stamp the next sequence and the wall clock ─────

    /// Issue `command` as the next sequence at `issued_at`.
    pub fn issue_at(
        &mut self,
        command: Command,
        issued_at: DateTime<Utc>,
    ) -> Result<CommandOutcome, EngineError> {
        let envelope = CommandEnvelope::new(self.last_sequence + 1, issued_at, command);
        self.apply(&envelope)
    }

    pub fn issue(&mut self, command: Command) -> Result<CommandOutcome, EngineError> {
        self.issue_at(command, Utc::now())
    }

    /// Create a node; returns its id.
    pub fn insert(&mut self, mut draft: NodeDraft) -> Result<NodeId, EngineError> {
        let id = draft.id.get_or_insert_with(new_node_id).clone();
        self.issue(Command::InsertNode { draft })?;
        Ok(id)
    }

    pub fn update(&mut self, patch: NodePatch) -> Result<CommandOutcome, EngineError> {
        self.issue(Command::UpdateNode { patch })
    }

    pub fn move_to(
        &mut self,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<CommandOutcome, EngineError> {
        self.issue(Command::MoveNode {
            node_id: node_id.to_string(),
            new_parent_id: new_parent_id.map(str::to_string),
        })
    }

    pub fn inactivate(
        &mut self,
        target_id: &str,
        actor: Option<&str>,
    ) -> Result<CommandOutcome, EngineError> {
        self.issue(Command::InactivateSubtree {
            target_id: target_id.to_string(),
            actor: actor.map(str::to_string),
        })
    }

    pub fn restore(&mut self, target_id: &str) -> Result<CommandOutcome, EngineError> {
        self.issue(Command::RestoreSubtree {
            target_id: target_id.to_string(),
        })
    }

    pub fn set_levels(
        &mut self,
        skill_id: &str,
        levels: Vec<ProficiencyLevel>,
    ) -> Result<CommandOutcome, EngineError> {
        self.issue(Command::SetProficiencyLevels {
            skill_id: skill_id.to_string(),
            levels,
        })
    }

    /// Drop bin records older than `retention`. The nodes stay in the forest.
    pub fn purge_expired(&mut self, now: DateTime<Utc>, retention: Duration) -> Vec<InactiveItem> {
        let purged = self.inactive.purge_expired(now, retention);
        if !purged.is_empty() {
            info!(purged = purged.len(), "inactive_bin.purge");
        }
        purged
    }
}
