//! Default configuration values

/// Declaration file looked up in the project root and every `subdirs` entry
pub const DECLARATION_FILE: &str = "modgraph.toml";

/// Project-level configuration file
pub const PROJECT_CONFIG_FILE: &str = "modgraph.config.toml";

/// Default base output directory, relative to the project root
pub const DEFAULT_OUTPUT_DIR: &str = "out";

/// Graph dump written by `generate`, relative to the base output directory
pub const GRAPH_FILE: &str = "graph.json";

/// Binary output subdirectory
pub const BIN_SUBDIR: &str = "bin";

/// Test log subdirectory
pub const TEST_SUBDIR: &str = "test";

/// Test log extension
pub const TEST_LOG_EXTENSION: &str = "log";

/// Vendor directory inside a module directory
pub const VENDOR_DIR: &str = "vendor";

/// Dependency manifest inside a module directory
pub const DEPENDENCY_MANIFEST: &str = "go.mod";

/// Toolchain binary checked by `check`
pub const GO_TOOLCHAIN: &str = "go";
