//! Configuration for k3dnode
//!
//! A small YAML file (default `~/.k3dnode/config`) selects the runtime and
//! carries the defaults applied to every node:
//!
//! ```yaml
//! runtime: docker
//! image: docker.io/rancher/k3s:v1.17.3-k3s1
//! defaults:
//!   labels:
//!     app: k3d
//!   env:
//!     - K3S_KUBECONFIG_OUTPUT=/output/kubeconfig.yaml
//! ```

pub mod manifest;

pub use manifest::{load_manifest_file, parse_manifest, Manifest, ManifestFormat};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{Node, NodeDefaults};
use crate::runtime::RuntimeKind;

/// Errors for configuration and manifest loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid manifest: {0}")]
    ManifestError(String),
}

/// Default config file location: ~/.k3dnode/config
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".k3dnode")
        .join("config")
}

/// The complete configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine used when the CLI does not name one
    #[serde(default)]
    pub runtime: RuntimeKind,

    /// Image for nodes that do not set their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub defaults: NodeDefaults,
}

impl Config {
    /// Fill in the configured image on nodes that do not name one
    pub fn apply_image(&self, nodes: &mut [Node]) {
        if let Some(image) = &self.image {
            for node in nodes.iter_mut().filter(|n| n.image.is_none()) {
                node.image = Some(image.clone());
            }
        }
    }
}

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Parse config from YAML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Serialize config to YAML string
pub fn serialize_config(config: &Config) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError(e.to_string()))
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

/// Load the config file, falling back to built-in defaults when it is absent
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
