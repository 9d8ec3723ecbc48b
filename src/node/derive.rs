//! Role configuration derivation
//!
//! Turns a user-facing node into the runtime-facing one: defaults merged in,
//! role sub-command prepended, role labels and API exposure applied. Each node
//! is derived at most once; a second attempt is rejected instead of stacking a
//! second sub-command and port mapping onto the node.

use tracing::debug;

use super::defaults::{
    NodeDefaults, DEFAULT_API_HOST_IP, DEFAULT_API_PORT, LABEL_API_HOST, LABEL_API_HOST_IP,
    LABEL_API_PORT, LABEL_ROLE,
};
use super::{Node, NodeError, Role};

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Overlay the node's labels onto a fresh copy of the default labels and
/// append the default environment after the node's own entries.
pub fn merge_defaults(node: &mut Node, defaults: &NodeDefaults) {
    let mut labels = defaults.labels.clone();
    labels.extend(std::mem::take(&mut node.labels));
    node.labels = labels;

    node.env.extend(defaults.env.iter().cloned());
}

/// Apply the role-specific configuration to a node, exactly once.
pub fn derive_node(node: &mut Node) -> Result<(), NodeError> {
    if node.is_derived() {
        return Err(NodeError::AlreadyDerived(node.name.clone()));
    }

    match node.role {
        Role::Worker => patch_worker(node),
        Role::Master => patch_master(node),
    }

    node.derived = true;
    Ok(())
}

/// Full preparation pipeline run by the orchestrator before dispatch:
/// guard, merge defaults, derive, validate.
pub fn prepare_node(mut node: Node, defaults: &NodeDefaults) -> Result<Node, NodeError> {
    if node.is_derived() {
        return Err(NodeError::AlreadyDerived(node.name));
    }
    debug!("Creating node from spec {:?}", node);

    merge_defaults(&mut node, defaults);
    derive_node(&mut node)?;
    node.validate()?;

    debug!("Derived spec {:?}", node);
    Ok(node)
}

fn prepend_command(node: &mut Node) {
    node.args.insert(0, node.role.command().to_string());
    node.labels
        .insert(LABEL_ROLE.to_string(), node.role.as_str().to_string());
}

fn patch_worker(node: &mut Node) {
    prepend_command(node);
}

fn patch_master(node: &mut Node) {
    prepend_command(node);

    let expose = &node.master_opts.expose_api;
    let mut host_ip = DEFAULT_API_HOST_IP.to_string();
    let mut api_port = DEFAULT_API_PORT.to_string();

    if let Some(port) = non_empty(&expose.port) {
        api_port = port.to_string();
        node.labels
            .insert(LABEL_API_PORT.to_string(), port.to_string());
    }

    if let Some(host) = non_empty(&expose.host) {
        if let Some(ip) = non_empty(&expose.host_ip) {
            host_ip = ip.to_string();
        }
        node.labels
            .insert(LABEL_API_HOST_IP.to_string(), host_ip.clone());
        node.labels
            .insert(LABEL_API_HOST.to_string(), host.to_string());

        // the serving certificate must be valid for the external name
        node.args.push("--tls-san".to_string());
        node.args.push(host.to_string());
    }

    node.ports
        .push(format!("{}:{}:{}/tcp", host_ip, api_port, DEFAULT_API_PORT));
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
