//! # Cluster node lifecycle
//!
//! Provisioning and teardown of the containers that make up a k3s cluster.
//!
//! ```text
//!   manifest nodes ──► merge defaults ──► derive role ──► Runtime::create_node
//!                                                            │
//!                                            ┌───────────────┴──────────────┐
//!                                            ▼                              ▼
//!                                         Docker                       containerd
//! ```
//!
//! Node status is never tracked here; query the container engine for it.

pub mod orchestrator;

pub use orchestrator::{
    create_node, create_nodes, delete_node, delete_node_with, delete_nodes, BatchOptions,
    BatchPolicy, BatchReport, NodeFailure,
};
