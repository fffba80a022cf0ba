//! `taxonomy-console`: replay command logs and inspect the result.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use taxonomy_kernel::commands::CommandEnvelope;
use taxonomy_kernel::engine::TaxonomyEngine;
use taxonomy_kernel::hashing::canonical_hash;
use taxonomy_kernel::inactive::purge_due_at;
use taxonomy_kernel::tree::{find_node_by_id, impact_of};
use taxonomy_runtime::config::ConsoleConfig;
use taxonomy_runtime::drift::compare_forests;
use taxonomy_runtime::logging::init_logging;
use taxonomy_runtime::replay::{parse_command_log, rebuild_engine};

#[derive(Parser, Debug)]
#[command(name = "taxonomy-console", version, about = "Skills taxonomy console")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a command log and print the canonical hash and node counts
    Replay { commands: PathBuf },
    /// Show what inactivating a node would touch
    Impact { commands: PathBuf, node_id: String },
    /// List the inactive bin after replaying a command log
    Inactive { commands: PathBuf },
    /// Compare the forests produced by two command logs
    Drift { before: PathBuf, after: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConsoleConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    init_logging(&config.log_level)?;

    match cli.command {
        Commands::Replay { commands } => {
            let engine = replay_file(&commands, &config)?;
            let forest = engine.forest();
            println!("hash:     {}", canonical_hash(forest));
            println!("sequence: {}", engine.last_sequence());
            println!("nodes:    {}", forest.node_count());
            println!("active:   {}", forest.active_count());
            println!("inactive: {}", engine.inactive().len());
        }
        Commands::Impact { commands, node_id } => {
            let engine = replay_file(&commands, &config)?;
            let node = find_node_by_id(engine.forest(), &node_id)
                .with_context(|| format!("node {} not found", node_id))?;
            let impact = impact_of(node);
            println!("{} ({})", node.name, node.node_type);
            println!("clusters: {}", impact.clusters);
            println!("groups:   {}", impact.groups);
            println!("skills:   {}", impact.skills);
            println!("usage:    {}", impact.usage.usage_count);
            println!("employees: {}", impact.usage.employee_count);
            println!("courses:  {}", impact.usage.course_count);
            println!("roles:    {}", impact.usage.role_count);
        }
        Commands::Inactive { commands } => {
            let engine = replay_file(&commands, &config)?;
            let retention = config.retention();
            for item in engine.inactive().items() {
                println!(
                    "{}\t{}\t{}\t{}\tby {}\tpurge after {}",
                    item.id,
                    item.node_type,
                    item.name,
                    item.parent_name.as_deref().unwrap_or("-"),
                    item.inactivated_by,
                    purge_due_at(item, retention)
                        .map(|due| due.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string()),
                );
            }
        }
        Commands::Drift { before, after } => {
            let a = replay_file(&before, &config)?;
            let b = replay_file(&after, &config)?;
            let report = compare_forests(a.forest(), b.forest());
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render drift report")?
            );
        }
    }
    Ok(())
}

fn replay_file(path: &Path, config: &ConsoleConfig) -> Result<TaxonomyEngine> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let envelopes: Vec<CommandEnvelope> = parse_command_log(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    rebuild_engine(&envelopes, config.engine_policy())
        .with_context(|| format!("failed to replay {}", path.display()))
}
