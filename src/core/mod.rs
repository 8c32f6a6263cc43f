//! Core business logic module
//!
//! This module contains all build-graph generation logic for modgraph.
//! Filesystem access goes through [`crate::infra::filesystem::FileSystem`].
//!
//! # Submodules
//!
//! - [`pattern`] - Glob pattern resolution with exclusions
//! - [`paths`] - Output and module path layout
//! - [`actions`] - Vendor, test and build action synthesis
//! - [`module`] - Module properties, the module contract and its context
//! - [`declaration`] - Declaration file (modgraph.toml) loading
//! - [`resolver`] - Module dependency resolution
//! - [`graph`] - Build graph assembly and serialization
//! - [`generator`] - Generation runs over a whole project
//! - [`check`] - Project validation
//! - [`config`] - Layered generation configuration

pub mod actions;
pub mod check;
pub mod config;
pub mod declaration;
pub mod generator;
pub mod graph;
pub mod module;
pub mod paths;
pub mod pattern;
pub mod resolver;
