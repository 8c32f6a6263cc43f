//! Generate command implementation
//!
//! Implements `modgraph generate`: runs every module's generation pass on
//! a pool of blocking tasks, assembles the results in dependency order and
//! writes the build graph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};

use super::project_generator;
use crate::cli::output::status;
use crate::cli::Session;
use crate::config::defaults::GRAPH_FILE;
use crate::core::generator::{generate_module, Generator, ModuleOutcome};
use crate::infra::filesystem::write_file;

/// Generate command options
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Graph file, relative to the project root unless absolute
    pub output: Option<PathBuf>,
    /// Parallel generation passes (defaults to the CPU count)
    pub jobs: Option<usize>,
    /// Skip writing the graph
    pub dry_run: bool,
}

/// Execute the generate command
pub async fn execute(session: &Session, options: GenerateOptions) -> Result<()> {
    let out = session.output;
    let generator = project_generator(session);

    tracing::info!("Generating build graph for {}", session.project_dir.display());
    let plan = generator
        .plan()
        .context("Failed to load module declarations")?;

    let jobs = options.jobs.unwrap_or_else(num_cpus::get).max(1);
    tracing::debug!("Generating {} modules with {jobs} jobs", plan.modules.len());

    let tasks = plan.modules.iter().cloned().map(|instance| {
        let config = Arc::clone(generator.config());
        let fs = Arc::clone(generator.fs());
        tokio::task::spawn_blocking(move || generate_module(&instance, &config, fs.as_ref()))
    });
    let outcomes = stream::iter(tasks)
        .buffered(jobs)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<ModuleOutcome>, _>>()
        .context("Module generation task failed")?;

    let report = Generator::report(plan, outcomes);
    let json = report.graph.to_json()?;

    if options.dry_run {
        tracing::info!("Dry run, not writing the build graph");
    } else {
        let path = graph_path(session, options.output.as_deref());
        write_file(&path, &json)?;
        out.status(status::SUCCESS, format!("Wrote {}", path.display()));
    }

    if out.json {
        println!("{json}");
    } else {
        out.status(
            status::INFO,
            format!(
                "{} modules, {} actions, fingerprint {}",
                report.order.len(),
                report.graph.len(),
                report.graph.fingerprint()?
            ),
        );
    }

    if !report.is_success() {
        for diagnostic in &report.diagnostics {
            out.problem(diagnostic.to_string());
        }
        bail!(
            "Generation finished with {} problem(s)",
            report.diagnostics.len()
        );
    }

    Ok(())
}

/// Where the graph is written
fn graph_path(session: &Session, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => session.project_dir.join(path),
        None => Path::new(&session.config.base_output_dir).join(GRAPH_FILE),
    }
}
