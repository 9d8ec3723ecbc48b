//! Docker engine adapter
//!
//! Drives the `docker` CLI, so whatever `DOCKER_HOST`/context the CLI is
//! configured with is the engine that receives the nodes.

use async_trait::async_trait;
use tracing::debug;

use super::command::{generate_create_args, generate_delete_args, EngineCli};
use super::{Runtime, RuntimeError, RuntimeKind};
use crate::node::Node;

/// Runtime backed by the Docker daemon
#[derive(Debug, Clone)]
pub struct Docker {
    cli: EngineCli,
}

impl Docker {
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Use a non-standard docker binary
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            cli: EngineCli::new(binary),
        }
    }

    pub fn cli(&self) -> &EngineCli {
        &self.cli
    }
}

impl Default for Docker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runtime for Docker {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Docker
    }

    async fn create_node(&self, node: &Node) -> Result<(), RuntimeError> {
        let id = self.cli.run(generate_create_args(node)).await?;
        debug!("Created docker container {} ({})", node.name, id);
        Ok(())
    }

    async fn delete_node(&self, node: &Node) -> Result<(), RuntimeError> {
        self.cli.run(generate_delete_args(node)).await?;
        debug!("Removed docker container {}", node.name);
        Ok(())
    }
}
