//! Node Orchestrator - creates and deletes cluster nodes through a runtime
//!
//! The orchestrator is a one-shot configuration-and-dispatch layer:
//! - Merges the process-wide defaults into each node
//! - Derives the role-specific configuration exactly once
//! - Hands the derived node to the configured runtime backend
//!
//! It keeps no state between calls and never retries a failed backend call.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::node::{prepare_node, Node, NodeDefaults, NodeError};
use crate::runtime::{Runtime, RuntimeKind};

/// What a batch does when one of its nodes fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BatchPolicy {
    /// Attempt every node, log failures, never abort
    #[default]
    BestEffort,
    /// Stop at the first failure; with `rollback`, delete the nodes already created
    Atomic { rollback: bool },
}

/// Options for batch creation
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub policy: BatchPolicy,
    /// Nodes dispatched concurrently; only honoured by the best-effort policy
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            policy: BatchPolicy::BestEffort,
            concurrency: 1,
        }
    }
}

/// A node the batch could not process
#[derive(Debug)]
pub struct NodeFailure {
    pub node: String,
    pub error: NodeError,
}

/// Outcome of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<Node>,
    pub failed: Vec<NodeFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded_names(&self) -> Vec<&str> {
        self.succeeded.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.node.as_str()).collect()
    }

    fn record(&mut self, name: String, result: Result<Node, NodeError>) {
        match result {
            Ok(node) => self.succeeded.push(node),
            Err(e) => {
                error!("Failed to process node '{}': {}", name, e);
                self.failed.push(NodeFailure {
                    node: name,
                    error: e,
                });
            }
        }
    }
}

// ============================================================================
// Creation
// ============================================================================

/// Create a single node.
///
/// Returns the derived node, stamped with the runtime that created it. The
/// first error (validation or backend) is returned as-is; nothing is
/// dispatched when validation fails.
pub async fn create_node(
    node: Node,
    runtime: &dyn Runtime,
    defaults: &NodeDefaults,
) -> Result<Node, NodeError> {
    let mut node = prepare_node(node, defaults)?;

    runtime.create_node(&node).await?;
    node.runtime = Some(runtime.kind());

    info!("Created {} node '{}' via {}", node.role, node.name, runtime.kind());
    Ok(node)
}

/// Create a batch of nodes.
///
/// With [`BatchPolicy::BestEffort`] every node is attempted, failures are
/// logged and collected in the report, and `Err` is never returned. With
/// [`BatchPolicy::Atomic`] the batch stops at the first failure and returns
/// [`NodeError::BatchAborted`], after optionally rolling back.
pub async fn create_nodes(
    nodes: Vec<Node>,
    runtime: &dyn Runtime,
    defaults: &NodeDefaults,
    options: &BatchOptions,
) -> Result<BatchReport, NodeError> {
    info!(
        "Creating {} nodes via {} ({:?})",
        nodes.len(),
        runtime.kind(),
        options.policy
    );

    match options.policy {
        BatchPolicy::BestEffort if options.concurrency > 1 => {
            Ok(create_concurrently(nodes, runtime, defaults, options.concurrency).await)
        }
        BatchPolicy::BestEffort => {
            let mut report = BatchReport::default();
            for node in nodes {
                let name = node.name.clone();
                let result = create_node(node, runtime, defaults).await;
                report.record(name, result);
            }
            Ok(report)
        }
        BatchPolicy::Atomic { rollback } => {
            create_atomically(nodes, runtime, defaults, rollback).await
        }
    }
}

/// Bounded fan-out; results are gathered in input order before logging so
/// failures are reported together rather than interleaved.
async fn create_concurrently(
    nodes: Vec<Node>,
    runtime: &dyn Runtime,
    defaults: &NodeDefaults,
    concurrency: usize,
) -> BatchReport {
    let results: Vec<(String, Result<Node, NodeError>)> = stream::iter(nodes)
        .map(|node| async move {
            let name = node.name.clone();
            (name, create_node(node, runtime, defaults).await)
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut report = BatchReport::default();
    for (name, result) in results {
        report.record(name, result);
    }
    report
}

async fn create_atomically(
    nodes: Vec<Node>,
    runtime: &dyn Runtime,
    defaults: &NodeDefaults,
    rollback: bool,
) -> Result<BatchReport, NodeError> {
    let mut report = BatchReport::default();

    for node in nodes {
        let name = node.name.clone();
        match create_node(node, runtime, defaults).await {
            Ok(created) => report.succeeded.push(created),
            Err(e) => {
                error!("Aborting batch at node '{}': {}", name, e);
                if rollback {
                    roll_back(&report.succeeded, runtime).await;
                }
                return Err(NodeError::BatchAborted {
                    node: name,
                    source: Box::new(e),
                });
            }
        }
    }

    Ok(report)
}

/// Delete already created nodes, newest first
async fn roll_back(created: &[Node], runtime: &dyn Runtime) {
    for node in created.iter().rev() {
        warn!("Rolling back node '{}'", node.name);
        if let Err(e) = runtime.delete_node(node).await {
            error!("Rollback of node '{}' failed: {}", node.name, e);
        }
    }
}

// ============================================================================
// Deletion
// ============================================================================

/// Delete a node via the engine named by `kind`.
///
/// Unlike creation in a best-effort batch, a backend failure here is both
/// logged and returned.
pub async fn delete_node(node: &Node, kind: RuntimeKind) -> Result<(), NodeError> {
    let runtime = kind.runtime();
    delete_node_with(node, runtime.as_ref()).await
}

/// Delete a node with an explicit runtime instance.
///
/// Fails before touching the backend if the node records a different
/// creating runtime.
pub async fn delete_node_with(node: &Node, runtime: &dyn Runtime) -> Result<(), NodeError> {
    remove_node(node, runtime).await.inspect_err(|e| {
        error!("Failed to delete node '{}': {}", node.name, e);
    })
}

/// Delete every node, continuing past failures
pub async fn delete_nodes(nodes: Vec<Node>, runtime: &dyn Runtime) -> BatchReport {
    let mut report = BatchReport::default();
    for node in nodes {
        let name = node.name.clone();
        let result = remove_node(&node, runtime).await.map(|_| node);
        report.record(name, result);
    }
    report
}

async fn remove_node(node: &Node, runtime: &dyn Runtime) -> Result<(), NodeError> {
    if let Some(created) = node.runtime {
        if created != runtime.kind() {
            return Err(NodeError::RuntimeMismatch {
                node: node.name.clone(),
                created,
                requested: runtime.kind(),
            });
        }
    }

    runtime.delete_node(node).await?;
    info!("Deleted node '{}' via {}", node.name, runtime.kind());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::defaults::{LABEL_API_HOST, LABEL_ROLE};
    use crate::node::ExposeApi;
    use crate::runtime::mock::MockRuntime;

    fn batch() -> Vec<Node> {
        vec![
            Node::master("server-0"),
            Node::worker("worker-0"),
            Node::worker("worker-1"),
            Node::worker("worker-2"),
        ]
    }

    #[tokio::test]
    async fn test_create_node_dispatches_derived_spec() {
        let runtime = MockRuntime::new();
        let node = Node::master("server-0").with_expose_api(ExposeApi {
            host: Some("cluster.example.com".to_string()),
            host_ip: Some("10.0.0.5".to_string()),
            port: Some("7443".to_string()),
        });

        let created = create_node(node, &runtime, &NodeDefaults::default())
            .await
            .unwrap();

        let dispatched = runtime.created();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].args[0], "server");
        assert_eq!(
            dispatched[0].labels.get(LABEL_API_HOST).map(String::as_str),
            Some("cluster.example.com")
        );
        assert_eq!(dispatched[0].ports, vec!["10.0.0.5:7443:6443/tcp"]);
        assert_eq!(created.runtime, Some(RuntimeKind::Docker));
        assert!(created.is_derived());
    }

    #[tokio::test]
    async fn test_create_node_propagates_backend_error() {
        let runtime = MockRuntime::new().failing_create("worker-0");
        let result = create_node(Node::worker("worker-0"), &runtime, &NodeDefaults::default()).await;
        assert!(matches!(result, Err(NodeError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_create_node_validation_error_skips_backend() {
        let runtime = MockRuntime::new();
        let node = Node::worker("worker-0").with_port("bogus");
        let result = create_node(node, &runtime, &NodeDefaults::default()).await;

        assert!(matches!(result, Err(NodeError::InvalidPortMapping { .. })));
        assert!(runtime.created().is_empty());
    }

    #[tokio::test]
    async fn test_create_node_rejects_rederivation() {
        let runtime = MockRuntime::new();
        let defaults = NodeDefaults::default();
        let created = create_node(Node::worker("w"), &runtime, &defaults).await.unwrap();

        let result = create_node(created, &runtime, &defaults).await;
        assert!(matches!(result, Err(NodeError::AlreadyDerived(_))));
        assert_eq!(runtime.created().len(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_attempts_every_node() {
        let runtime = MockRuntime::new().failing_create("worker-1");
        let report = create_nodes(batch(), &runtime, &NodeDefaults::default(), &BatchOptions::default())
            .await
            .unwrap();

        assert_eq!(
            runtime.created_names(),
            vec!["server-0", "worker-0", "worker-1", "worker-2"]
        );
        assert_eq!(report.succeeded_names(), vec!["server-0", "worker-0", "worker-2"]);
        assert_eq!(report.failed_names(), vec!["worker-1"]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_best_effort_concurrent_keeps_order() {
        let runtime = MockRuntime::new().failing_create("worker-0");
        let options = BatchOptions {
            policy: BatchPolicy::BestEffort,
            concurrency: 3,
        };
        let report = create_nodes(batch(), &runtime, &NodeDefaults::default(), &options)
            .await
            .unwrap();

        assert_eq!(runtime.created().len(), 4);
        assert_eq!(report.succeeded_names(), vec!["server-0", "worker-1", "worker-2"]);
        assert_eq!(report.failed_names(), vec!["worker-0"]);
    }

    #[tokio::test]
    async fn test_batch_nodes_do_not_share_labels() {
        let runtime = MockRuntime::new();
        let nodes = vec![
            Node::worker("a").with_label("only", "a"),
            Node::master("b"),
        ];
        let defaults = NodeDefaults::default();
        create_nodes(nodes, &runtime, &defaults, &BatchOptions::default())
            .await
            .unwrap();

        let created = runtime.created();
        assert!(!created[1].labels.contains_key("only"));
        assert_eq!(created[0].labels.get(LABEL_ROLE).map(String::as_str), Some("worker"));
        assert_eq!(created[1].labels.get(LABEL_ROLE).map(String::as_str), Some("master"));
        assert_eq!(defaults, NodeDefaults::default());
    }

    #[tokio::test]
    async fn test_atomic_stops_at_first_failure() {
        let runtime = MockRuntime::new().failing_create("worker-0");
        let options = BatchOptions {
            policy: BatchPolicy::Atomic { rollback: false },
            ..Default::default()
        };
        let result = create_nodes(batch(), &runtime, &NodeDefaults::default(), &options).await;

        assert!(matches!(
            result,
            Err(NodeError::BatchAborted { ref node, .. }) if node == "worker-0"
        ));
        assert_eq!(runtime.created_names(), vec!["server-0", "worker-0"]);
        assert!(runtime.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_atomic_rollback_deletes_created_in_reverse() {
        let runtime = MockRuntime::new().failing_create("worker-1");
        let options = BatchOptions {
            policy: BatchPolicy::Atomic { rollback: true },
            ..Default::default()
        };
        let result = create_nodes(batch(), &runtime, &NodeDefaults::default(), &options).await;

        assert!(result.is_err());
        assert_eq!(runtime.deleted(), vec!["worker-0", "server-0"]);
    }

    #[tokio::test]
    async fn test_atomic_success_returns_report() {
        let runtime = MockRuntime::new();
        let options = BatchOptions {
            policy: BatchPolicy::Atomic { rollback: true },
            ..Default::default()
        };
        let report = create_nodes(batch(), &runtime, &NodeDefaults::default(), &options)
            .await
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.succeeded.len(), 4);
    }

    #[tokio::test]
    async fn test_delete_propagates_backend_error() {
        let runtime = MockRuntime::new().failing_delete("worker-0");
        let result = delete_node_with(&Node::worker("worker-0"), &runtime).await;
        assert!(matches!(result, Err(NodeError::Runtime(_))));
        assert_eq!(runtime.deleted(), vec!["worker-0"]);
    }

    #[tokio::test]
    async fn test_delete_refuses_runtime_mismatch() {
        let runtime = MockRuntime::new().with_kind(RuntimeKind::Containerd);
        let mut node = Node::worker("worker-0");
        node.runtime = Some(RuntimeKind::Docker);

        let result = delete_node_with(&node, &runtime).await;
        assert!(matches!(result, Err(NodeError::RuntimeMismatch { .. })));
        assert!(runtime.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_delete_created_node_roundtrip() {
        let runtime = MockRuntime::new();
        let created = create_node(Node::worker("w"), &runtime, &NodeDefaults::default())
            .await
            .unwrap();
        assert!(delete_node_with(&created, &runtime).await.is_ok());
        assert_eq!(runtime.deleted(), vec!["w"]);
    }

    #[tokio::test]
    async fn test_delete_nodes_continues_past_failures() {
        let runtime = MockRuntime::new().failing_delete("worker-0");
        let report = delete_nodes(batch(), &runtime).await;
        assert_eq!(runtime.deleted().len(), 4);
        assert_eq!(report.failed_names(), vec!["worker-0"]);
        assert_eq!(report.succeeded.len(), 3);
    }
}
