//! Replay orchestrator: rebuild a forest from a command log.
//!
//! Delegates all domain logic to the kernel engine. The log is expected
//! to be resolved (as produced by `TaxonomyEngine::history`), which makes
//! replay a pure function of the log.

use thiserror::Error;

use taxonomy_kernel::commands::CommandEnvelope;
use taxonomy_kernel::domain::Forest;
use taxonomy_kernel::engine::{EnginePolicy, TaxonomyEngine};
use taxonomy_kernel::error::EngineError;
use taxonomy_kernel::hashing::canonical_hash;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("command log could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("replay failed: {0}")]
    Engine(#[from] EngineError),

    #[error("two replays produced different hashes: {first} vs {second}")]
    Nondeterministic { first: String, second: String },
}

/// Parse a JSON array of command envelopes.
pub fn parse_command_log(json: &str) -> Result<Vec<CommandEnvelope>, ReplayError> {
    Ok(serde_json::from_str(json)?)
}

/// Replay `envelopes` into a fresh engine and return it.
pub fn rebuild_engine(
    envelopes: &[CommandEnvelope],
    policy: EnginePolicy,
) -> Result<TaxonomyEngine, ReplayError> {
    let mut engine = TaxonomyEngine::with_policy(policy);
    engine.apply_sequence(envelopes)?;
    Ok(engine)
}

/// Rebuild the forest and its canonical hash.
pub fn rebuild_forest(
    envelopes: &[CommandEnvelope],
    policy: EnginePolicy,
) -> Result<(Forest, String), ReplayError> {
    let engine = rebuild_engine(envelopes, policy)?;
    let forest = engine.forest().clone();
    let hash = canonical_hash(&forest);
    Ok((forest, hash))
}

/// Replay twice and insist on identical hashes. Returns the hash.
pub fn verify_determinism(
    envelopes: &[CommandEnvelope],
    policy: EnginePolicy,
) -> Result<String, ReplayError> {
    let (_, first) = rebuild_forest(envelopes, policy.clone())?;
    let (_, second) = rebuild_forest(envelopes, policy)?;
    if first != second {
        return Err(ReplayError::Nondeterministic { first, second });
    }
    Ok(first)
}
