//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod check;
pub mod deps;
pub mod generate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::Session;
use crate::core::generator::Generator;
use crate::infra::filesystem::OsFileSystem;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the build graph for every declared module
    Generate {
        /// Where to write the graph (defaults to <out-dir>/graph.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Number of modules generated in parallel
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Generate without writing the graph
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate declarations without writing anything
    Check,

    /// Display module dependency order
    Deps {
        /// Show only the dependencies of this module
        module: Option<String>,

        /// Output in DOT graph format
        #[arg(long)]
        dot: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Self::Generate {
                output,
                jobs,
                dry_run,
            } => {
                let options = generate::GenerateOptions {
                    output,
                    jobs,
                    dry_run,
                };
                generate::execute(session, options).await
            }
            Self::Check => check::execute(session).await,
            Self::Deps { module, dot } => deps::execute(session, module.as_deref(), dot).await,
        }
    }
}

/// Generator over the session's project directory
pub(crate) fn project_generator(session: &Session) -> Generator {
    let fs = Arc::new(OsFileSystem::new(&session.project_dir));
    Generator::new(session.config.clone(), fs)
}
