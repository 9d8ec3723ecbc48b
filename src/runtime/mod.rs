//! Container runtime backends
//!
//! The orchestrator only ever sees the [`Runtime`] trait. Which adapter backs
//! it is chosen by the caller through a validated [`RuntimeKind`].

pub mod command;
pub mod containerd;
pub mod docker;

pub use containerd::Containerd;
pub use docker::Docker;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::Node;

/// Errors that can occur while talking to a container engine
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Unknown runtime '{0}' (expected 'docker' or 'containerd')")]
    UnknownRuntime(String),

    #[error("Failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// Supported container engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    #[default]
    Docker,
    Containerd,
}

impl RuntimeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeKind::Docker => "docker",
            RuntimeKind::Containerd => "containerd",
        }
    }

    /// Build the adapter for this engine with its default binary
    pub fn runtime(&self) -> Box<dyn Runtime> {
        match self {
            RuntimeKind::Docker => Box::new(Docker::new()),
            RuntimeKind::Containerd => Box::new(Containerd::new()),
        }
    }
}

impl FromStr for RuntimeKind {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docker" => Ok(RuntimeKind::Docker),
            "containerd" => Ok(RuntimeKind::Containerd),
            other => Err(RuntimeError::UnknownRuntime(other.to_string())),
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SBIO: Trait for abstraction (allows mocking in tests)
// ============================================================================

/// A container engine able to create and remove k3s node containers
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Engine backing this runtime
    fn kind(&self) -> RuntimeKind;

    async fn create_node(&self, node: &Node) -> Result<(), RuntimeError>;

    async fn delete_node(&self, node: &Node) -> Result<(), RuntimeError>;
}

// ============================================================================
// SBIO: Mock implementation for testing (no I/O)
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every call and fails for the configured node names
    pub struct MockRuntime {
        kind: RuntimeKind,
        fail_create: HashSet<String>,
        fail_delete: HashSet<String>,
        created: Mutex<Vec<Node>>,
        deleted: Mutex<Vec<String>>,
    }

    impl MockRuntime {
        pub fn new() -> Self {
            Self {
                kind: RuntimeKind::Docker,
                fail_create: HashSet::new(),
                fail_delete: HashSet::new(),
                created: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
            }
        }

        pub fn with_kind(mut self, kind: RuntimeKind) -> Self {
            self.kind = kind;
            self
        }

        pub fn failing_create(mut self, name: &str) -> Self {
            self.fail_create.insert(name.to_string());
            self
        }

        pub fn failing_delete(mut self, name: &str) -> Self {
            self.fail_delete.insert(name.to_string());
            self
        }

        /// Nodes the backend was asked to create, in call order
        pub fn created(&self) -> Vec<Node> {
            self.created.lock().unwrap().clone()
        }

        pub fn created_names(&self) -> Vec<String> {
            self.created().into_iter().map(|n| n.name).collect()
        }

        pub fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Runtime for MockRuntime {
        fn kind(&self) -> RuntimeKind {
            self.kind
        }

        async fn create_node(&self, node: &Node) -> Result<(), RuntimeError> {
            self.created.lock().unwrap().push(node.clone());
            if self.fail_create.contains(&node.name) {
                return Err(RuntimeError::CommandFailed {
                    command: format!("create {}", node.name),
                    stderr: "mock failure".to_string(),
                });
            }
            Ok(())
        }

        async fn delete_node(&self, node: &Node) -> Result<(), RuntimeError> {
            self.deleted.lock().unwrap().push(node.name.clone());
            if self.fail_delete.contains(&node.name) {
                return Err(RuntimeError::CommandFailed {
                    command: format!("delete {}", node.name),
                    stderr: "mock failure".to_string(),
                });
            }
            Ok(())
        }
    }
}
