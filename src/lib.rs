//! Modgraph - build-graph generator for tested Go binaries
//!
//! Reads declarative module files and produces, for every
//! `go_tested_binary` module, the vendor, test and build actions an
//! external build executor runs.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (pattern resolution, action synthesis, graph assembly)
//! - [`infra`] - Infrastructure layer (filesystem, platform directories)
//! - [`config`] - Constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
