//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::config::{absolute_project_dir, ConfigOverrides, GenConfig};
use crate::infra::dirs::ModgraphDirs;
use commands::Commands;
use output::OutputConfig;

/// Modgraph - build-graph generator for tested Go binaries
///
/// Reads modgraph.toml declarations and emits vendor, test and build
/// actions for an external build executor.
#[derive(Parser, Debug)]
#[command(name = "modgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long = "dir", global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Base output directory for binaries and test logs
    #[arg(long, global = true, value_name = "DIR")]
    pub out_dir: Option<String>,

    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Everything a command needs to run
#[derive(Debug, Clone)]
pub struct Session {
    /// Project root
    pub project_dir: PathBuf,
    /// Resolved generation configuration
    pub config: GenConfig,
    /// Output settings
    pub output: OutputConfig,
}

impl Cli {
    /// Resolve the project directory and load the layered configuration
    pub fn session(&self) -> Result<Session> {
        let project_dir = match &self.dir {
            Some(dir) => {
                absolute_project_dir(dir).context("Failed to resolve project directory")?
            }
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let overrides = ConfigOverrides {
            output_dir: self.out_dir.clone(),
            debug: (self.verbose >= 2).then_some(true),
        };
        let config = GenConfig::load(&project_dir, &ModgraphDirs::new(), &overrides)
            .context("Failed to load configuration")?;

        Ok(Session {
            project_dir,
            config,
            output: OutputConfig::new(self.quiet, self.json, self.verbose),
        })
    }

    /// Execute the CLI command
    pub async fn run(self, session: Session) -> Result<()> {
        if let Some(cmd) = self.command {
            cmd.run(&session).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
