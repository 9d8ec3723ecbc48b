//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results, I/O is handled by caller

use std::path::Path;

use thiserror::Error;

use super::{CreateArgs, DeleteArgs};
use crate::cluster::{self, BatchOptions, BatchPolicy, BatchReport};
use crate::config::{load_manifest_file, Config, ConfigError, Manifest};
use crate::node::{prepare_node, Node, NodeError, Role};
use crate::runtime::{Runtime, RuntimeKind};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Node(#[from] NodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write manifest: {0}")]
    Serialize(String),

    #[error("Nothing to delete: pass node names or --file")]
    NothingToDelete,
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Pure business logic
// ============================================================================

/// The CLI flag wins over the config file
pub fn resolve_runtime(flag: Option<RuntimeKind>, config: &Config) -> RuntimeKind {
    flag.unwrap_or(config.runtime)
}

/// Translate create flags into batch options
pub fn batch_options(args: &CreateArgs) -> BatchOptions {
    let policy = if args.atomic {
        BatchPolicy::Atomic {
            rollback: args.rollback,
        }
    } else {
        BatchPolicy::BestEffort
    };

    BatchOptions {
        policy,
        concurrency: args.concurrency.max(1),
    }
}

/// Derive every node without dispatching, for `--dry-run`
pub fn plan_nodes(nodes: Vec<Node>, config: &Config) -> CommandResult<Vec<Node>> {
    nodes
        .into_iter()
        .map(|node| prepare_node(node, &config.defaults).map_err(CommandError::from))
        .collect()
}

/// Nodes to delete, from a manifest and/or bare names.
///
/// Only the name matters to the engine, so bare names become worker nodes.
pub fn deletion_targets(names: &[String], manifest: Option<Manifest>) -> CommandResult<Vec<Node>> {
    let mut nodes = manifest.map(|m| m.nodes).unwrap_or_default();
    nodes.extend(names.iter().map(|name| Node::new(name.clone(), Role::Worker)));

    if nodes.is_empty() {
        return Err(CommandError::NothingToDelete);
    }
    Ok(nodes)
}

/// Serialize created nodes so a later delete knows which runtime owns them
pub fn created_manifest(report: &BatchReport) -> CommandResult<String> {
    let manifest = Manifest {
        nodes: report.succeeded.clone(),
    };
    serde_yaml::to_string(&manifest).map_err(|e| CommandError::Serialize(e.to_string()))
}

// ============================================================================
// I/O wrappers
// ============================================================================

/// Load a manifest and fill in the configured image
pub fn load_nodes(path: &Path, config: &Config) -> CommandResult<Vec<Node>> {
    let mut nodes = load_manifest_file(path)?.nodes;
    config.apply_image(&mut nodes);
    Ok(nodes)
}

/// Create the nodes of a manifest.
///
/// A best-effort batch yields `Ok` with the failures listed in the report.
pub async fn run_create(
    args: &CreateArgs,
    config: &Config,
    runtime: &dyn Runtime,
) -> CommandResult<BatchReport> {
    let nodes = load_nodes(&args.file, config)?;
    let report =
        cluster::create_nodes(nodes, runtime, &config.defaults, &batch_options(args)).await?;

    if let Some(output) = &args.output {
        std::fs::write(output, created_manifest(&report)?)?;
    }

    Ok(report)
}

/// Delete nodes named on the command line or listed in a manifest
pub async fn run_delete(args: &DeleteArgs, runtime: &dyn Runtime) -> CommandResult<BatchReport> {
    let manifest = match &args.file {
        Some(path) => Some(load_manifest_file(path)?),
        None => None,
    };
    let nodes = deletion_targets(&args.names, manifest)?;
    Ok(cluster::delete_nodes(nodes, runtime).await)
}
