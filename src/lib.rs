//! k3dnode - provision and tear down the containers of a k3s cluster
//!
//! Nodes are described by [`node::Node`], derived according to their role and
//! handed to a pluggable [`runtime::Runtime`] (Docker or containerd) by the
//! functions in [`cluster`].

pub mod cli;
pub mod cluster;
pub mod config;
pub mod node;
pub mod runtime;

pub use cluster::{create_node, create_nodes, delete_node, BatchOptions, BatchPolicy, BatchReport};
pub use node::{Node, NodeDefaults, NodeError, Role};
pub use runtime::{Runtime, RuntimeError, RuntimeKind};
