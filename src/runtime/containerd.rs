//! containerd adapter
//!
//! Drives `nerdctl`, containerd's Docker-compatible CLI, with every node
//! container kept in a dedicated containerd namespace.

use async_trait::async_trait;
use tracing::debug;

use super::command::{generate_create_args, generate_delete_args, EngineCli};
use super::{Runtime, RuntimeError, RuntimeKind};
use crate::node::Node;

/// containerd namespace holding node containers
pub const DEFAULT_NAMESPACE: &str = "k3d";

/// Runtime backed by containerd
#[derive(Debug, Clone)]
pub struct Containerd {
    cli: EngineCli,
}

impl Containerd {
    pub fn new() -> Self {
        Self::with_binary("nerdctl")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            cli: EngineCli::new(binary).with_global_args(&["--namespace", DEFAULT_NAMESPACE]),
        }
    }

    pub fn cli(&self) -> &EngineCli {
        &self.cli
    }
}

impl Default for Containerd {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runtime for Containerd {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Containerd
    }

    async fn create_node(&self, node: &Node) -> Result<(), RuntimeError> {
        let id = self.cli.run(generate_create_args(node)).await?;
        debug!(
            "Created containerd container {} ({}) in namespace {}",
            node.name, id, DEFAULT_NAMESPACE
        );
        Ok(())
    }

    async fn delete_node(&self, node: &Node) -> Result<(), RuntimeError> {
        self.cli.run(generate_delete_args(node)).await?;
        debug!("Removed containerd container {}", node.name);
        Ok(())
    }
}
