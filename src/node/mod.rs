//! Node specification - one container-backed member of a k3s cluster
//!
//! A Node is built by a caller (usually from a manifest), mutated exactly once
//! by the orchestrator and the role deriver, then handed to a runtime backend.

pub mod defaults;
pub mod derive;
pub mod ports;

pub use defaults::{NodeDefaults, DEFAULT_IMAGE};
pub use derive::{derive_node, merge_defaults, prepare_node};
pub use ports::PortMapping;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::{RuntimeError, RuntimeKind};

/// Errors raised while validating, deriving or dispatching a node
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Unknown node role '{0}'")]
    UnknownRole(String),

    #[error("Invalid node name '{0}': must match [a-zA-Z0-9][a-zA-Z0-9_.-]*")]
    InvalidName(String),

    #[error("Node '{0}' has already been derived")]
    AlreadyDerived(String),

    #[error("Invalid port mapping '{mapping}' on node '{node}': {reason}")]
    InvalidPortMapping {
        node: String,
        mapping: String,
        reason: String,
    },

    #[error("Node '{node}' was created by the {created} runtime, refusing to delete it via {requested}")]
    RuntimeMismatch {
        node: String,
        created: RuntimeKind,
        requested: RuntimeKind,
    },

    #[error("Batch aborted at node '{node}': {source}")]
    BatchAborted {
        node: String,
        #[source]
        source: Box<NodeError>,
    },

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Role of a node in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Control-plane node running `k3s server`
    Master,
    /// Worker node running `k3s agent`
    Worker,
}

impl Role {
    /// Value written to the `k3d.role` label
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }

    /// k3s sub-command implied by the role
    pub fn command(&self) -> &'static str {
        match self {
            Role::Master => "server",
            Role::Worker => "agent",
        }
    }
}

impl FromStr for Role {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" | "control-plane" | "server" => Ok(Role::Master),
            "worker" | "agent" => Ok(Role::Worker),
            other => Err(NodeError::UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = NodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a control-plane node publishes the Kubernetes API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposeApi {
    /// Externally visible host name, added as a TLS SAN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Host interface the API port is bound to
    #[serde(default, alias = "hostIP", skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,

    /// Host port the API is published on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

/// Options only meaningful for control-plane nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterOpts {
    #[serde(default)]
    pub expose_api: ExposeApi,
}

/// A containerized k3s node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique name within the cluster, also used as container name
    pub name: String,

    pub role: Role,

    /// Image to run; the configured default image when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// `KEY=value` assignments
    #[serde(default)]
    pub env: Vec<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// `[hostIP:]hostPort:containerPort[/protocol]`
    #[serde(default)]
    pub ports: Vec<String>,

    /// `host:container` bind mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default)]
    pub restart: bool,

    #[serde(default)]
    pub master_opts: MasterOpts,

    /// Runtime that created this node, recorded by the orchestrator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeKind>,

    /// Set once role derivation has run, so a written-back node is not
    /// derived again when it is read in a second time
    #[serde(default, skip_serializing_if = "is_false")]
    pub(crate) derived: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            image: None,
            labels: BTreeMap::new(),
            env: Vec::new(),
            args: Vec::new(),
            ports: Vec::new(),
            volumes: Vec::new(),
            network: None,
            restart: false,
            master_opts: MasterOpts::default(),
            runtime: None,
            derived: false,
        }
    }

    pub fn master(name: impl Into<String>) -> Self {
        Self::new(name, Role::Master)
    }

    pub fn worker(name: impl Into<String>) -> Self {
        Self::new(name, Role::Worker)
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_port(mut self, mapping: impl Into<String>) -> Self {
        self.ports.push(mapping.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_expose_api(mut self, expose_api: ExposeApi) -> Self {
        self.master_opts.expose_api = expose_api;
        self
    }

    /// Whether role derivation has already been applied.
    ///
    /// A node stamped with its creating runtime has been through derivation
    /// even when the marker was stripped from a hand-edited manifest.
    pub fn is_derived(&self) -> bool {
        self.derived || self.runtime.is_some()
    }

    /// Validate the name and every port mapping before dispatch
    pub fn validate(&self) -> Result<(), NodeError> {
        if !name_pattern().is_match(&self.name) {
            return Err(NodeError::InvalidName(self.name.clone()));
        }
        self.validate_ports()
    }

    /// Validate every port mapping, failing on the first malformed one
    pub fn validate_ports(&self) -> Result<(), NodeError> {
        for mapping in &self.ports {
            mapping
                .parse::<PortMapping>()
                .map_err(|reason| NodeError::InvalidPortMapping {
                    node: self.name.clone(),
                    mapping: mapping.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}

/// Container names accepted by both Docker and nerdctl
fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").expect("node name pattern is valid")
    })
}
