//! CLI command for displaying module dependencies
//!
//! Implements the `modgraph deps` command.

use anyhow::{bail, Context, Result};
use serde_json::json;

use super::project_generator;
use crate::cli::Session;

/// Execute the deps command
pub async fn execute(session: &Session, module: Option<&str>, dot: bool) -> Result<()> {
    let out = session.output;
    let plan = project_generator(session)
        .plan()
        .context("Failed to resolve module dependencies")?;

    if let Some(name) = module {
        if !plan.dependencies.contains(name) {
            bail!("Module '{name}' is not declared");
        }
    }

    if dot {
        print!("{}", plan.dependencies.to_dot(module));
        return Ok(());
    }

    let order: Vec<String> = match module {
        Some(name) => {
            let deps = plan.dependencies.dependencies_of(name);
            plan.order()
                .into_iter()
                .filter(|m| deps.contains(m))
                .collect()
        }
        None => plan.order(),
    };

    out.json(&json!({
        "module": module,
        "order": order,
        "dependents": module.map(|name| plan.dependencies.dependents_of(name)),
    }))?;

    match module {
        Some(name) if order.is_empty() => out.line(format!("'{name}' has no dependencies")),
        Some(name) => {
            out.line(format!("Dependencies of '{name}', in generation order:"));
            for dep in &order {
                out.line(format!("  • {dep}"));
            }
        }
        None => {
            out.line("Modules in generation order:");
            for (i, name) in order.iter().enumerate() {
                let deps = plan.dependencies.dependencies_of(name);
                if deps.is_empty() {
                    out.line(format!("  {}. {name}", i + 1));
                } else {
                    let list: Vec<&str> = deps.iter().map(String::as_str).collect();
                    out.line(format!("  {}. {name} (after {})", i + 1, list.join(", ")));
                }
            }
        }
    }

    for diagnostic in &plan.diagnostics {
        out.warning(diagnostic.to_string());
    }

    Ok(())
}
