//! CLI module for k3dnode
//!
//! Subcommands:
//! - `k3dnode create` - Create the nodes listed in a manifest
//! - `k3dnode delete` - Delete nodes by name or from a manifest
//! - `k3dnode config` - Show the effective configuration

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::runtime::RuntimeKind;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "k3dnode")]
#[command(about = "Provision and tear down containerized k3s cluster nodes")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ~/.k3dnode/config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the nodes described in a manifest
    Create(CreateArgs),

    /// Delete nodes
    Delete(DeleteArgs),

    /// Print the effective configuration
    Config,
}

/// Arguments for the create command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Node manifest (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Container runtime: docker or containerd
    #[arg(long, env = "K3DNODE_RUNTIME")]
    pub runtime: Option<RuntimeKind>,

    /// Stop at the first node that fails
    #[arg(long)]
    pub atomic: bool,

    /// With --atomic, delete nodes already created when one fails
    #[arg(long, requires = "atomic")]
    pub rollback: bool,

    /// Nodes created in parallel; atomic batches always run one at a time
    #[arg(long, default_value = "1", conflicts_with = "atomic")]
    pub concurrency: usize,

    /// Write the created nodes to this manifest, for a later `delete -f`
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show the derived nodes and engine commands without creating anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Names of the node containers to delete
    pub names: Vec<String>,

    /// Delete every node listed in this manifest
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Container runtime: docker or containerd
    #[arg(long, env = "K3DNODE_RUNTIME")]
    pub runtime: Option<RuntimeKind>,
}
