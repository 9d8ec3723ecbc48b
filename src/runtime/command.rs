//! Shared command-line driver for Docker-compatible engine CLIs
//!
//! Both `docker` and `nerdctl` accept the same `run`/`rm` flags, so the
//! argument generation lives here and the adapters only pick the binary.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::RuntimeError;
use crate::node::{Node, DEFAULT_IMAGE};

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Generate `run` arguments for a derived node
///
/// k3s needs a privileged container with tmpfs on /run and /var/run.
pub fn generate_create_args(node: &Node) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        node.name.clone(),
        "--hostname".to_string(),
        node.name.clone(),
        "--privileged".to_string(),
        "--tmpfs".to_string(),
        "/run".to_string(),
        "--tmpfs".to_string(),
        "/var/run".to_string(),
    ];

    for (key, value) in &node.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }

    for entry in &node.env {
        args.push("-e".to_string());
        args.push(entry.clone());
    }

    for mapping in &node.ports {
        args.push("-p".to_string());
        args.push(mapping.clone());
    }

    for volume in &node.volumes {
        args.push("-v".to_string());
        args.push(volume.clone());
    }

    if let Some(network) = &node.network {
        args.push("--network".to_string());
        args.push(network.clone());
    }

    if node.restart {
        args.push("--restart".to_string());
        args.push("unless-stopped".to_string());
    }

    args.push(node.image.as_deref().unwrap_or(DEFAULT_IMAGE).to_string());

    // args[0] is the k3s sub-command
    args.extend(node.args.iter().cloned());

    args
}

/// Generate forced `rm` arguments
pub fn generate_delete_args(node: &Node) -> Vec<String> {
    vec!["rm".to_string(), "-f".to_string(), node.name.clone()]
}

/// Render a command line for logs and dry runs
pub fn format_command(binary: &str, args: &[String]) -> String {
    let mut line = binary.to_string();
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push_str(&format!("'{}'", arg));
        } else {
            line.push_str(arg);
        }
    }
    line
}

// ============================================================================
// SBIO: I/O implementation
// ============================================================================

/// A container engine CLI with optional global flags (e.g. `--namespace`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCli {
    pub binary: String,
    pub global_args: Vec<String>,
}

impl EngineCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            global_args: Vec::new(),
        }
    }

    pub fn with_global_args(mut self, args: &[&str]) -> Self {
        self.global_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Full argument vector: global flags followed by the sub-command
    pub fn full_args(&self, args: Vec<String>) -> Vec<String> {
        let mut full = self.global_args.clone();
        full.extend(args);
        full
    }

    /// Run the CLI to completion, mapping a non-zero exit to an error
    pub async fn run(&self, args: Vec<String>) -> Result<String, RuntimeError> {
        let args = self.full_args(args);
        let line = format_command(&self.binary, &args);
        debug!("Running {}", line);

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RuntimeError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RuntimeError::CommandFailed {
                command: line,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
