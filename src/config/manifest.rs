//! Node manifests - the list of nodes a cluster planner hands to k3dnode
//!
//! ```yaml
//! nodes:
//!   - name: k3d-mycluster-server-0
//!     role: master
//!     masterOpts:
//!       exposeApi:
//!         host: cluster.example.com
//!         hostIp: 10.0.0.5
//!         port: "7443"
//!   - name: k3d-mycluster-worker-0
//!     role: worker
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::node::Node;

/// A set of nodes to create or delete together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Encoding of a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// Pick the format from the file extension; YAML otherwise
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ManifestFormat::Json,
            _ => ManifestFormat::Yaml,
        }
    }
}

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Parse and validate a manifest.
///
/// Unknown roles are rejected here, so such nodes never reach a runtime.
pub fn parse_manifest(content: &str, format: ManifestFormat) -> Result<Manifest, ConfigError> {
    let manifest: Manifest = match format {
        ManifestFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ManifestError(e.to_string()))?,
        ManifestFormat::Json => serde_json::from_str(content)
            .map_err(|e| ConfigError::ManifestError(e.to_string()))?,
    };

    let mut seen = HashSet::new();
    for node in &manifest.nodes {
        if !seen.insert(node.name.as_str()) {
            return Err(ConfigError::ManifestError(format!(
                "duplicate node name '{}'",
                node.name
            )));
        }
    }

    Ok(manifest)
}

// ============================================================================
// SBIO: I/O wrapper
// ============================================================================

pub fn load_manifest_file(path: &Path) -> Result<Manifest, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content, ManifestFormat::from_path(path))
}
