//! Modgraph CLI - build-graph generator for tested Go binaries
//!
//! Entry point for the modgraph command-line application.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use modgraph::cli::output::display_error;
use modgraph::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = match cli.session() {
        Ok(session) => session,
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    };

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 if session.config.debug => Level::DEBUG,
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    // RUST_LOG applies unless a flag or the config picks the level
    let explicit = cli.quiet || cli.verbose > 0 || session.config.debug;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) if !explicit => filter,
        _ => EnvFilter::default().add_directive(level.into()),
    };

    // Initialize tracing subscriber; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Run the command and handle errors
    match cli.run(session).await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
