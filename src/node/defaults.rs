//! Process-wide node defaults and well-known label keys

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Image used when neither the node nor the config names one
pub const DEFAULT_IMAGE: &str = "docker.io/rancher/k3s:latest";

/// Port the k3s API server listens on inside the container
pub const DEFAULT_API_PORT: &str = "6443";

/// Host interface the API is published on when no exposure is configured
pub const DEFAULT_API_HOST_IP: &str = "0.0.0.0";

pub const LABEL_ROLE: &str = "k3d.role";
pub const LABEL_API_PORT: &str = "k3d.master.api.port";
pub const LABEL_API_HOST_IP: &str = "k3d.master.api.hostIP";
pub const LABEL_API_HOST: &str = "k3d.master.api.host";

/// Labels and environment applied to every node before role derivation.
///
/// Passed by reference at call time and cloned into each node, so no two
/// nodes ever share label storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefaults {
    /// Base labels; a node's own labels win on key collision
    #[serde(default = "default_object_labels")]
    pub labels: BTreeMap<String, String>,

    /// Appended after the node's own environment
    #[serde(default = "default_node_env")]
    pub env: Vec<String>,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            labels: default_object_labels(),
            env: default_node_env(),
        }
    }
}

fn default_object_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), "k3d".to_string())])
}

fn default_node_env() -> Vec<String> {
    vec!["K3S_KUBECONFIG_OUTPUT=/output/kubeconfig.yaml".to_string()]
}
