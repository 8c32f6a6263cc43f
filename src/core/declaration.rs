//! Module declaration files (modgraph.toml)
//!
//! A declaration file holds one array of tables per module type, plus an
//! optional `subdirs` list naming child directories with their own
//! declaration files:
//!
//! ```toml
//! subdirs = ["services/api"]
//!
//! [[go_tested_binary]]
//! name = "app"
//! pkg = "."
//! testPkg = "./..."
//! srcs = ["**/*.go"]
//! testSrcs = ["**/*_test.go"]
//! vendorFirst = true
//! ```
//!
//! Every module's directory is the directory of the file declaring it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::config::defaults::DECLARATION_FILE;
use crate::core::module::{tested_binary_factory, Module, TESTED_BINARY_TYPE};
use crate::core::paths::join_path;
use crate::error::DeclarationError;
use crate::infra::filesystem::FileSystem;

/// Key listing child directories
const SUBDIRS_KEY: &str = "subdirs";

/// One module entry as written in a declaration file
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Module type name (table key)
    pub module_type: String,
    /// Directory of the declaring file, relative to the project root
    pub module_dir: String,
    /// Declaring file, relative to the project root
    pub file: String,
    /// Raw properties
    pub properties: toml::Table,
}

/// Every declaration reachable from the root declaration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationSet {
    /// Declarations, file by file in visiting order
    pub declarations: Vec<Declaration>,
    /// Declaration files read, root first
    pub files: Vec<String>,
}

impl DeclarationSet {
    /// Read the root declaration file and every file its `subdirs` reach
    pub fn load(fs: &dyn FileSystem) -> Result<Self, DeclarationError> {
        let mut set = Self::default();
        let mut visited = HashSet::new();
        load_dir(fs, ".", &mut set, &mut visited)?;
        Ok(set)
    }
}

fn load_dir(
    fs: &dyn FileSystem,
    dir: &str,
    set: &mut DeclarationSet,
    visited: &mut HashSet<String>,
) -> Result<(), DeclarationError> {
    if !visited.insert(dir.to_string()) {
        return Ok(());
    }

    let file = join_path(&[dir, DECLARATION_FILE]);
    set.files.push(file.clone());
    let content = fs
        .read_to_string(&file)
        .map_err(|e| DeclarationError::Read {
            file: file.clone(),
            error: e.to_string(),
        })?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| DeclarationError::Parse {
        file: file.clone(),
        error: e.to_string(),
    })?;

    let mut subdirs = Vec::new();
    for (key, value) in table {
        if key == SUBDIRS_KEY {
            subdirs = parse_subdirs(&file, &value)?;
            continue;
        }

        let invalid = || DeclarationError::InvalidModuleTable {
            file: file.clone(),
            module_type: key.clone(),
        };
        let toml::Value::Array(entries) = value else {
            return Err(invalid());
        };
        for entry in entries {
            let toml::Value::Table(properties) = entry else {
                return Err(invalid());
            };
            set.declarations.push(Declaration {
                module_type: key.clone(),
                module_dir: dir.to_string(),
                file: file.clone(),
                properties,
            });
        }
    }

    for subdir in subdirs {
        let child = join_path(&[dir, &subdir]);
        if !fs.is_file(&join_path(&[&child, DECLARATION_FILE])) {
            return Err(DeclarationError::MissingSubdir {
                file: file.clone(),
                dir: child,
            });
        }
        tracing::debug!("Descending into {child}");
        load_dir(fs, &child, set, visited)?;
    }

    Ok(())
}

fn parse_subdirs(file: &str, value: &toml::Value) -> Result<Vec<String>, DeclarationError> {
    let parse_error = |error: String| DeclarationError::Parse {
        file: file.to_string(),
        error,
    };

    let entries = value
        .as_array()
        .ok_or_else(|| parse_error("'subdirs' must be an array of strings".to_string()))?;

    entries
        .iter()
        .map(|entry| {
            let dir = entry
                .as_str()
                .ok_or_else(|| parse_error("'subdirs' must be an array of strings".to_string()))?;
            if dir.starts_with('/') || dir.split('/').any(|s| s == "..") {
                return Err(parse_error(format!(
                    "subdir '{dir}' must be a relative path inside the project"
                )));
            }
            Ok(dir.to_string())
        })
        .collect()
}

/// Factory turning declared properties into a module
pub type ModuleFactory = fn(&str, toml::Table) -> Result<Box<dyn Module>, DeclarationError>;

/// Registered module types
#[derive(Debug, Clone, Default)]
pub struct ModuleTypeRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in module types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TESTED_BINARY_TYPE, tested_binary_factory);
        registry
    }

    /// Register a module type
    pub fn register(&mut self, module_type: &str, factory: ModuleFactory) {
        self.factories.insert(module_type.to_string(), factory);
    }

    /// Registered type names, sorted
    pub fn types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build a module from a declaration
    pub fn create(&self, declaration: Declaration) -> Result<Box<dyn Module>, DeclarationError> {
        let factory = self.factories.get(&declaration.module_type).ok_or_else(|| {
            DeclarationError::UnknownModuleType {
                file: declaration.file.clone(),
                module_type: declaration.module_type.clone(),
            }
        })?;
        factory(&declaration.file, declaration.properties)
    }
}

/// A module together with where it was declared
#[derive(Debug, Clone)]
pub struct ModuleInstance {
    /// The module
    pub module: Arc<dyn Module>,
    /// Directory of the declaring file
    pub module_dir: String,
    /// Declaring file
    pub file: String,
}

impl ModuleInstance {
    /// Module name
    pub fn name(&self) -> &str {
        self.module.name()
    }
}

/// Turn declarations into modules
///
/// Every declaration is attempted; failures are returned alongside the
/// modules that were created. A module whose name is already taken is
/// dropped.
pub fn instantiate(
    registry: &ModuleTypeRegistry,
    declarations: Vec<Declaration>,
) -> (Vec<ModuleInstance>, Vec<DeclarationError>) {
    let mut modules = Vec::new();
    let mut errors = Vec::new();
    let mut names: HashMap<String, String> = HashMap::new();

    for declaration in declarations {
        let module_dir = declaration.module_dir.clone();
        let file = declaration.file.clone();
        let module = match registry.create(declaration) {
            Ok(module) => module,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        if let Some(existing) = names.get(module.name()) {
            errors.push(DeclarationError::DuplicateModule {
                name: module.name().to_string(),
                file,
                existing: existing.clone(),
            });
            continue;
        }
        names.insert(module.name().to_string(), file.clone());

        modules.push(ModuleInstance {
            module: Arc::from(module),
            module_dir,
            file,
        });
    }

    (modules, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::filesystem::MemoryFileSystem;

    const ROOT: &str = r#"
subdirs = ["services/api"]

[[go_tested_binary]]
name = "app"
pkg = "."
srcs = ["*.go"]
"#;

    const API: &str = r#"
[[go_tested_binary]]
name = "api"
pkg = "./cmd/api"
deps = ["app"]
"#;

    #[test]
    fn test_load_follows_subdirs() {
        let fs = MemoryFileSystem::new()
            .with_file("modgraph.toml", ROOT)
            .with_file("services/api/modgraph.toml", API);

        let set = DeclarationSet::load(&fs).unwrap();
        assert_eq!(set.files, vec!["modgraph.toml", "services/api/modgraph.toml"]);
        let decls = set.declarations;
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].module_dir, ".");
        assert_eq!(decls[0].file, "modgraph.toml");
        assert_eq!(decls[1].module_dir, "services/api");
        assert_eq!(decls[1].file, "services/api/modgraph.toml");
        assert_eq!(decls[1].module_type, TESTED_BINARY_TYPE);
    }

    #[test]
    fn test_missing_root_file() {
        let fs = MemoryFileSystem::new();
        assert!(matches!(
            DeclarationSet::load(&fs),
            Err(DeclarationError::Read { .. })
        ));
    }

    #[test]
    fn test_missing_subdir_file() {
        let fs = MemoryFileSystem::new().with_file("modgraph.toml", ROOT);
        let err = DeclarationSet::load(&fs).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::MissingSubdir {
                file: "modgraph.toml".to_string(),
                dir: "services/api".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_files() {
        let fs = MemoryFileSystem::new().with_file("modgraph.toml", "[[go_tested_binary]\n");
        assert!(matches!(
            DeclarationSet::load(&fs),
            Err(DeclarationError::Parse { .. })
        ));

        let fs = MemoryFileSystem::new().with_file("modgraph.toml", "go_tested_binary = 3\n");
        assert!(matches!(
            DeclarationSet::load(&fs),
            Err(DeclarationError::InvalidModuleTable { .. })
        ));

        let fs = MemoryFileSystem::new().with_file("modgraph.toml", "subdirs = [\"../x\"]\n");
        assert!(matches!(
            DeclarationSet::load(&fs),
            Err(DeclarationError::Parse { .. })
        ));
    }

    #[test]
    fn test_instantiate_reports_unknown_types_and_duplicates() {
        let fs = MemoryFileSystem::new().with_file(
            "modgraph.toml",
            r#"
[[cc_binary]]
name = "c"

[[go_tested_binary]]
name = "app"
pkg = "."

[[go_tested_binary]]
name = "app"
pkg = "./other"
"#,
        );
        let decls = DeclarationSet::load(&fs).unwrap().declarations;
        let (modules, errors) = instantiate(&ModuleTypeRegistry::with_defaults(), decls);

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name(), "app");
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| matches!(e, DeclarationError::UnknownModuleType { module_type, .. } if module_type == "cc_binary")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, DeclarationError::DuplicateModule { name, .. } if name == "app")));
    }

    #[test]
    fn test_registry_defaults() {
        let registry = ModuleTypeRegistry::with_defaults();
        assert_eq!(registry.types(), vec![TESTED_BINARY_TYPE]);
    }
}
