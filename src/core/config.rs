//! Generation configuration
//!
//! [`GenConfig`] is the read-only value every module generation pass
//! receives. It is assembled from layered sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. user `config.toml` in the platform config directory
//! 3. project `modgraph.config.toml`
//! 4. `MODGRAPH_OUTPUT_DIR` / `MODGRAPH_DEBUG`
//! 5. command-line overrides

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults::{DEFAULT_OUTPUT_DIR, PROJECT_CONFIG_FILE};
use crate::error::ConfigError;
use crate::infra::dirs::ModgraphDirs;

/// Environment variable overriding the base output directory
pub const ENV_OUTPUT_DIR: &str = "MODGRAPH_OUTPUT_DIR";

/// Environment variable enabling debug logging
pub const ENV_DEBUG: &str = "MODGRAPH_DEBUG";

/// Configuration shared by every module generation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenConfig {
    /// Directory binaries and test logs are written below
    pub base_output_dir: String,
    /// Emit per-module debug logging
    pub debug: bool,
}

impl GenConfig {
    /// Create a configuration with debug logging off
    pub fn new(base_output_dir: impl Into<String>) -> Self {
        Self {
            base_output_dir: base_output_dir.into(),
            debug: false,
        }
    }

    /// Set the debug flag
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load the full layered configuration for a project
    pub fn load(
        project_dir: &Path,
        dirs: &ModgraphDirs,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let project_dir = absolute_project_dir(project_dir)?;
        let layers = [
            ConfigFile::load_from_path(&dirs.global_config_path())?,
            ConfigFile::load_from_path(&project_dir.join(PROJECT_CONFIG_FILE))?,
            ConfigFile::from_env(|name| std::env::var(name).ok())?,
        ];
        Ok(Self::resolve(&project_dir, &layers, overrides))
    }

    /// Merge layers (lowest precedence first) and overrides
    ///
    /// A relative output directory is resolved against `project_dir`.
    pub fn resolve(project_dir: &Path, layers: &[ConfigFile], overrides: &ConfigOverrides) -> Self {
        let mut merged = ConfigFile::default();
        for layer in layers {
            merged.merge(layer);
        }

        let dir = overrides
            .output_dir
            .clone()
            .or(merged.output.dir)
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
        let dir_path = Path::new(&dir);
        let base_output_dir = if dir_path.is_absolute() {
            dir
        } else {
            project_dir.join(dir_path).to_string_lossy().into_owned()
        };

        Self {
            base_output_dir,
            debug: overrides.debug.or(merged.log.debug).unwrap_or(false),
        }
    }
}

/// Make a project directory absolute against the current directory
///
/// Generated commands run from other directories, so every output path
/// derived from the project root must be absolute.
pub fn absolute_project_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| ConfigError::ProjectDir {
        path: dir.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(cwd.join(dir))
}

/// Command-line overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--out-dir`
    pub output_dir: Option<String>,
    /// `-vv`
    pub debug: Option<bool>,
}

/// One configuration layer as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Output settings
    #[serde(default)]
    pub output: OutputSection,

    /// Logging settings
    #[serde(default)]
    pub log: LogSection,
}

/// `[output]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Base output directory
    pub dir: Option<String>,
}

/// `[log]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSection {
    /// Enable debug logging
    pub debug: Option<bool>,
}

impl ConfigFile {
    /// Load a layer from a file
    ///
    /// A missing file yields an empty layer.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Build a layer from environment variables
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut layer = Self::default();
        layer.output.dir = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty());
        if let Some(value) = lookup(ENV_DEBUG) {
            layer.log.debug = Some(parse_flag(&value).ok_or_else(|| ConfigError::InvalidEnv {
                name: ENV_DEBUG.to_string(),
                value: value.clone(),
            })?);
        }
        Ok(layer)
    }

    /// Overlay `other` on top of this layer
    pub fn merge(&mut self, other: &ConfigFile) {
        if other.output.dir.is_some() {
            self.output.dir.clone_from(&other.output.dir);
        }
        if other.log.debug.is_some() {
            self.log.debug = other.log.debug;
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
