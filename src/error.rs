//! Error types for modgraph
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Glob pattern resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern syntax is not valid
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The literal directory part of the pattern does not exist
    #[error("Pattern '{pattern}' refers to missing directory '{dir}'")]
    MissingDirectory { pattern: String, dir: String },

    /// Directory listing failed
    #[error("Failed to read '{path}' while resolving '{pattern}': {error}")]
    ReadFailed {
        pattern: String,
        path: String,
        error: String,
    },
}

impl PatternError {
    /// The pattern this error was raised for
    pub fn pattern(&self) -> &str {
        match self {
            Self::InvalidPattern { pattern, .. }
            | Self::MissingDirectory { pattern, .. }
            | Self::ReadFailed { pattern, .. } => pattern,
        }
    }
}

/// A diagnostic attributed to one property of one module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{module}: property '{field}': {message}")]
pub struct PropertyError {
    /// Module name
    pub module: String,
    /// Property name (`srcs`, `testSrcs`, ...)
    pub field: String,
    /// Offending pattern, when the error came from glob resolution
    pub pattern: Option<String>,
    /// Human-readable message
    pub message: String,
}

/// Build graph construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two actions claim the same output path
    #[error("Output '{output}' of module '{module}' is already produced by module '{existing}'")]
    DuplicateOutput {
        output: String,
        module: String,
        existing: String,
    },
}

/// Module declaration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// Declaration file could not be read
    #[error("Failed to read declaration file '{file}': {error}")]
    Read { file: String, error: String },

    /// Declaration file is not valid TOML
    #[error("Failed to parse declaration file '{file}': {error}")]
    Parse { file: String, error: String },

    /// Subdirectory listed in `subdirs` has no declaration file
    #[error("Subdirectory '{dir}' listed in '{file}' has no declaration file")]
    MissingSubdir { file: String, dir: String },

    /// Module type is not registered
    #[error("Unknown module type '{module_type}' in '{file}'")]
    UnknownModuleType { file: String, module_type: String },

    /// Module type entry is not an array of tables
    #[error("Module type '{module_type}' in '{file}' must be an array of tables")]
    InvalidModuleTable { file: String, module_type: String },

    /// A property has an invalid value
    #[error("Module '{module}' in '{file}': {message}")]
    InvalidProperty {
        file: String,
        module: String,
        message: String,
    },

    /// Two modules share a name
    #[error("Module '{name}' declared in '{file}' is already declared in '{existing}'")]
    DuplicateModule {
        name: String,
        file: String,
        existing: String,
    },
}

/// Module dependency resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Missing dependency
    #[error("Missing dependency: '{dependency}' required by '{module}'")]
    MissingDependency { module: String, dependency: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Environment variable has an unusable value
    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnv { name: String, value: String },

    /// Current directory is unavailable for a relative project root
    #[error("Failed to resolve project directory '{path}': {error}")]
    ProjectDir { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to list a directory
    #[error("Failed to walk directory '{path}': {error}")]
    Walk { path: PathBuf, error: String },
}

/// Per-module problem surfaced by a generation run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Property-level error (pattern resolution, validation)
    #[error("{0}")]
    Property(#[from] PropertyError),

    /// Graph builder rejected the module's actions
    #[error("{0}")]
    Graph(#[from] GraphError),

    /// Cross-module dependency problem
    #[error("{0}")]
    Dependency(#[from] ResolverError),

    /// Declaration could not be turned into a module
    #[error("{0}")]
    Declaration(#[from] DeclarationError),
}

/// Top-level modgraph error type
#[derive(Error, Debug)]
pub enum ModgraphError {
    /// Declaration error
    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Config error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Graph serialization error
    #[error("Failed to serialize build graph: {0}")]
    Serialize(#[from] serde_json::Error),
}
