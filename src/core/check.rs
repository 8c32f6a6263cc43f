//! Check command logic
//!
//! Loads every declaration, orders the modules and runs their generation
//! passes without writing anything, then reports what was found.

use crate::config::defaults::GO_TOOLCHAIN;
use crate::core::actions::Rule;
use crate::core::generator::Generator;
use crate::error::{Diagnostic, ModgraphError};

/// Result of the check operation
#[derive(Debug, Default)]
pub struct CheckResult {
    /// Modules that would be generated
    pub modules: Vec<String>,
    /// Generation order (dependencies first)
    pub build_order: Vec<String>,
    /// Number of actions the graph would contain
    pub action_count: usize,
    /// Problems that make generation fail
    pub diagnostics: Vec<Diagnostic>,
    /// Problems that do not
    pub warnings: Vec<String>,
    /// Whether the Go toolchain is on PATH
    pub toolchain_available: bool,
}

impl CheckResult {
    /// Check if all validations passed
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Perform the check operation on a project
///
/// A dependency cycle is reported as a diagnostic rather than an error.
pub fn check(generator: &Generator) -> Result<CheckResult, ModgraphError> {
    let mut result = CheckResult {
        toolchain_available: check_toolchain_availability(),
        ..CheckResult::default()
    };

    match generator.generate() {
        Ok(report) => {
            result.modules = report.order.clone();
            result.build_order = report.order;
            result.action_count = report.graph.len();
            result.diagnostics = report.diagnostics;

            for action in report.graph.actions() {
                if action.action.rule != Rule::Vendor {
                    continue;
                }
                for manifest in &action.action.implicits {
                    if !generator.fs().is_file(manifest) {
                        result.warnings.push(format!(
                            "Module '{}' vendors dependencies but '{manifest}' does not exist",
                            action.module
                        ));
                    }
                }
            }
        }
        Err(ModgraphError::Resolver(e)) => {
            result.diagnostics.push(Diagnostic::from(e));
            result.modules = generator.module_names()?;
        }
        Err(e) => return Err(e),
    }

    if !result.toolchain_available {
        result
            .warnings
            .push(format!("Go toolchain '{GO_TOOLCHAIN}' not found in PATH"));
    }

    Ok(result)
}

/// Check if the Go toolchain is available
fn check_toolchain_availability() -> bool {
    which::which(GO_TOOLCHAIN).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GenConfig;
    use crate::error::ResolverError;
    use crate::infra::filesystem::MemoryFileSystem;
    use std::sync::Arc;

    fn generator(fs: MemoryFileSystem) -> Generator {
        Generator::new(GenConfig::new("out"), Arc::new(fs))
    }

    #[test]
    fn test_check_valid_project() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "modgraph.toml",
                "[[go_tested_binary]]\nname = \"app\"\npkg = \".\"\nsrcs = [\"*.go\"]\n",
            )
            .with_file("main.go", "");

        let result = check(&generator(fs)).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.modules, vec!["app"]);
        assert_eq!(result.action_count, 1);
    }

    #[test]
    fn test_check_reports_cycles_as_diagnostics() {
        let fs = MemoryFileSystem::new().with_file(
            "modgraph.toml",
            r#"
[[go_tested_binary]]
name = "a"
pkg = "."
deps = ["b"]

[[go_tested_binary]]
name = "b"
pkg = "./b"
deps = ["a"]
"#,
        );

        let result = check(&generator(fs)).unwrap();
        assert!(!result.is_valid());
        assert!(matches!(
            result.diagnostics.as_slice(),
            [Diagnostic::Dependency(ResolverError::CircularDependency { .. })]
        ));
        assert_eq!(result.modules, vec!["a", "b"]);
        assert!(result.build_order.is_empty());
    }

    #[test]
    fn test_check_warns_about_missing_go_mod() {
        let fs = MemoryFileSystem::new().with_file(
            "modgraph.toml",
            "[[go_tested_binary]]\nname = \"app\"\npkg = \".\"\nvendorFirst = true\n",
        );

        let result = check(&generator(fs)).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("go.mod")));
    }

    #[test]
    fn test_check_propagates_declaration_file_errors() {
        let result = check(&generator(MemoryFileSystem::new()));
        assert!(matches!(result, Err(ModgraphError::Declaration(_))));
    }
}
