//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use crate::cluster::BatchReport;
use crate::node::{Node, DEFAULT_IMAGE};
use crate::runtime::command::{format_command, generate_create_args};
use crate::runtime::{Containerd, Docker, RuntimeKind};

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No nodes.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();
    let mut push_row = |cells: Vec<String>| {
        let last = cells.len().saturating_sub(1);
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                output.push_str("   ");
            }
            if i < last {
                output.push_str(&format!("{:width$}", cell, width = widths[i]));
            } else {
                output.push_str(cell);
            }
        }
        output.push('\n');
    };

    push_row(headers.iter().map(|h| h.to_uppercase()).collect());
    for row in rows {
        push_row(row);
    }

    output
}

// ============================================================================
// Node display
// ============================================================================

/// Format derived nodes as a table
pub fn format_node_table(nodes: &[Node]) -> String {
    let rows = nodes
        .iter()
        .map(|n| {
            vec![
                n.name.clone(),
                n.role.to_string(),
                n.image.clone().unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
                n.ports.join(","),
            ]
        })
        .collect();

    format_table(&["NAME", "ROLE", "IMAGE", "PORTS"], rows)
}

/// Format the dry-run plan: each derived node and the engine command that
/// would create it.
pub fn format_dry_run(nodes: &[Node], kind: RuntimeKind) -> String {
    let cli = match kind {
        RuntimeKind::Docker => Docker::new().cli().clone(),
        RuntimeKind::Containerd => Containerd::new().cli().clone(),
    };

    let mut output = String::new();
    output.push_str(&format!(
        "k3dnode v{} - Dry Run ({} nodes via {})\n\n",
        env!("CARGO_PKG_VERSION"),
        nodes.len(),
        kind
    ));
    output.push_str(&format_node_table(nodes));
    output.push('\n');

    for node in nodes {
        output.push_str(&format!("[{}]\n", node.name));
        for (key, value) in &node.labels {
            output.push_str(&format!("  label {}={}\n", key, value));
        }
        let args = cli.full_args(generate_create_args(node));
        output.push_str(&format!("  $ {}\n\n", format_command(&cli.binary, &args)));
    }

    output.push_str("Remove --dry-run to create these nodes.\n");
    output
}

/// Summarize a batch outcome
pub fn format_report(report: &BatchReport, verb: &str) -> String {
    let mut output = String::new();
    for node in &report.succeeded {
        output.push_str(&format!("{} {}\n", verb, node.name));
    }
    for failure in &report.failed {
        output.push_str(&format!("FAILED {}: {}\n", failure.node, failure.error));
    }
    output.push_str(&format!(
        "\n{} succeeded, {} failed\n",
        report.succeeded.len(),
        report.failed.len()
    ));
    output
}
