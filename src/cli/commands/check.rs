//! Check command implementation
//!
//! Implements `modgraph check` to validate declarations without writing
//! the build graph.

use anyhow::{bail, Context, Result};
use serde_json::json;

use super::project_generator;
use crate::cli::output::status;
use crate::cli::Session;
use crate::core::check;

/// Execute the check command
pub async fn execute(session: &Session) -> Result<()> {
    let out = session.output;
    tracing::info!("Checking project: {}", session.project_dir.display());

    let result = check::check(&project_generator(session))
        .context("Failed to load module declarations")?;

    out.json(&json!({
        "valid": result.is_valid(),
        "modules": result.modules,
        "build_order": result.build_order,
        "actions": result.action_count,
        "diagnostics": result.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "warnings": result.warnings,
        "toolchain_available": result.toolchain_available,
    }))?;

    out.line("Checking module declarations...\n");

    if result.diagnostics.is_empty() {
        out.status(status::SUCCESS, "All modules generate cleanly");
    } else {
        out.status(status::ERROR, "Problems found");
        for diagnostic in &result.diagnostics {
            out.line(format!("  - {diagnostic}"));
        }
    }

    if result.toolchain_available {
        out.status(status::SUCCESS, "Go toolchain is available");
    }

    if !result.warnings.is_empty() {
        out.line("\nWarnings:");
        for warning in &result.warnings {
            out.line(format!("  {} {warning}", status::WARNING));
        }
    }

    out.line("\nModules in generation order:");
    let listed = if result.build_order.is_empty() {
        &result.modules
    } else {
        &result.build_order
    };
    if listed.is_empty() {
        out.line("  (none)");
    }
    for module in listed {
        out.line(format!("  • {module}"));
    }
    out.line(format!("\n{} actions would be generated", result.action_count));

    out.line("");
    if result.is_valid() {
        out.status(status::SUCCESS, "Check passed");
        Ok(())
    } else {
        bail!("Check failed - please fix the issues above");
    }
}
