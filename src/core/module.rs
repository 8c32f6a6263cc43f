//! Module adapter
//!
//! Defines the typed property struct for `go_tested_binary` modules, the
//! [`Module`] contract the host drives, and the per-module
//! [`ModuleContext`] that carries configuration in and descriptors out.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::actions::{synthesize, ActionDescriptor, ResolvedInputs};
use crate::core::config::GenConfig;
use crate::core::paths::{join_path, ModulePaths};
use crate::core::pattern::{resolve_compiled, Glob};
use crate::error::{DeclarationError, PatternError, PropertyError};
use crate::infra::filesystem::FileSystem;

/// Module type name used in declaration files
pub const TESTED_BINARY_TYPE: &str = "go_tested_binary";

/// Properties of a tested Go binary module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModuleSpec {
    /// Unique module name
    pub name: String,

    /// Go package to build with `go build`
    #[serde(default)]
    pub pkg: String,

    /// Go package to test; empty skips testing
    #[serde(default)]
    pub test_pkg: String,

    /// Source file patterns
    #[serde(default)]
    pub srcs: Vec<String>,

    /// Patterns removed from `srcs` matches
    #[serde(default)]
    pub srcs_exclude: Vec<String>,

    /// Test-only source patterns
    #[serde(default)]
    pub test_srcs: Vec<String>,

    /// Run `go mod vendor` before testing and building
    #[serde(default)]
    pub vendor_first: bool,

    /// The executor may skip the vendor action
    #[serde(default)]
    pub optional_vendor: bool,

    /// The executor may skip the build action
    #[serde(default)]
    pub optional_build: bool,

    /// The executor may skip the test action
    #[serde(default)]
    pub optional_test: bool,

    /// Names of modules this one depends on
    #[serde(default)]
    pub deps: Vec<String>,
}

impl ModuleSpec {
    /// Check property values the executor depends on
    ///
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !is_valid_module_name(&self.name) {
            errors.push(format!(
                "property 'name': '{}' is not a valid module name (letters, digits, '_', '.', '-'; must start with a letter or digit)",
                self.name
            ));
        }
        if self.pkg.trim().is_empty() {
            errors.push("property 'pkg': must not be empty".to_string());
        }
        if self.deps.iter().any(|d| d == &self.name) {
            errors.push("property 'deps': a module cannot depend on itself".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Exclusions applied to every `srcs` pattern, with the field each
    /// comes from: `srcsExclude` then `testSrcs`
    pub fn build_excludes(&self) -> Vec<(&'static str, &str)> {
        self.srcs_exclude
            .iter()
            .map(|p| ("srcsExclude", p.as_str()))
            .chain(self.test_srcs.iter().map(|p| ("testSrcs", p.as_str())))
            .collect()
    }
}

/// Check that a module name is usable as a path component
pub fn is_valid_module_name(name: &str) -> bool {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("Invalid regex"))
        .is_match(name)
}

/// Contract between a module type and the host
pub trait Module: fmt::Debug + Send + Sync {
    /// Module name
    fn name(&self) -> &str;

    /// Names of the modules that must be processed before this one
    fn dynamic_dependencies(&self) -> Vec<String>;

    /// Register this module's build actions with `ctx`
    ///
    /// On failure, record property errors and register nothing.
    fn generate_build_actions(&self, ctx: &mut ModuleContext<'_>);
}

/// Per-module view handed to [`Module::generate_build_actions`]
pub struct ModuleContext<'a> {
    module_name: String,
    module_dir: String,
    config: &'a GenConfig,
    fs: &'a dyn FileSystem,
    actions: Vec<ActionDescriptor>,
    errors: Vec<PropertyError>,
    glob_deps: BTreeSet<String>,
}

impl<'a> ModuleContext<'a> {
    /// Create a context for module `module_name` declared in `module_dir`
    pub fn new(
        module_name: &str,
        module_dir: &str,
        config: &'a GenConfig,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self {
            module_name: module_name.to_string(),
            module_dir: join_path(&[module_dir]),
            config,
            fs,
            actions: Vec::new(),
            errors: Vec::new(),
            glob_deps: BTreeSet::new(),
        }
    }

    /// Module name
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Directory the module was declared in, relative to the project root
    pub fn module_dir(&self) -> &str {
        &self.module_dir
    }

    /// Shared configuration
    pub fn config(&self) -> &GenConfig {
        self.config
    }

    /// Resolve `pattern` in the module directory
    ///
    /// Returned paths are relative to the project root. Every path examined
    /// is recorded as a generator dependency, even on failure of a later
    /// pattern.
    pub fn glob_with_deps(
        &mut self,
        pattern: &str,
        excludes: &[Glob],
    ) -> Result<Vec<String>, PatternError> {
        let glob = Glob::compile(pattern)?;
        let matches = resolve_compiled(self.fs, &self.module_dir, &glob, excludes)?;
        self.glob_deps.extend(matches.deps);
        Ok(matches
            .files
            .iter()
            .map(|f| join_path(&[&self.module_dir, f]))
            .collect())
    }

    /// Record a property-level error
    pub fn property_error(&mut self, field: &str, pattern: Option<&str>, message: String) {
        self.errors.push(PropertyError {
            module: self.module_name.clone(),
            field: field.to_string(),
            pattern: pattern.map(str::to_string),
            message,
        });
    }

    /// Register an action
    pub fn build(&mut self, action: ActionDescriptor) {
        self.actions.push(action);
    }

    /// Whether any property error was recorded
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume the context
    pub fn finish(self) -> ContextOutput {
        ContextOutput {
            actions: self.actions,
            errors: self.errors,
            glob_deps: self.glob_deps.into_iter().collect(),
        }
    }
}

/// What a generation pass produced for one module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOutput {
    /// Registered actions, in registration order
    pub actions: Vec<ActionDescriptor>,
    /// Property errors
    pub errors: Vec<PropertyError>,
    /// Paths examined while resolving globs
    pub glob_deps: Vec<String>,
}

/// A Go binary built with `go build`, tested with `go test`, optionally
/// vendored first
#[derive(Debug, Clone)]
pub struct TestedBinaryModule {
    spec: ModuleSpec,
}

impl TestedBinaryModule {
    /// Wrap validated properties
    pub fn new(spec: ModuleSpec) -> Self {
        Self { spec }
    }

    /// The module's properties
    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    /// Compile the `srcs` exclusions
    ///
    /// A malformed `srcsExclude` entry is reported once here. A malformed
    /// `testSrcs` entry is skipped silently, it is reported when the test
    /// sources are resolved.
    fn compile_excludes(&self, ctx: &mut ModuleContext<'_>) -> Vec<Glob> {
        let mut globs = Vec::new();
        for (field, pattern) in self.spec.build_excludes() {
            match Glob::compile(pattern) {
                Ok(glob) => globs.push(glob),
                Err(e) if field == "srcsExclude" => {
                    tracing::debug!("{}: {e}", self.spec.name);
                    ctx.property_error(
                        field,
                        Some(pattern),
                        format!("Invalid exclusion pattern {pattern}: {e}"),
                    );
                }
                Err(_) => {}
            }
        }
        globs
    }

    /// Resolve every pattern in `patterns`, attempting all of them
    fn resolve_all(
        &self,
        ctx: &mut ModuleContext<'_>,
        field: &str,
        patterns: &[String],
        excludes: &[Glob],
    ) -> Vec<String> {
        let mut files = Vec::new();
        let mut seen = BTreeSet::new();
        for pattern in patterns {
            match ctx.glob_with_deps(pattern, excludes) {
                Ok(matches) => {
                    for file in matches {
                        if seen.insert(file.clone()) {
                            files.push(file);
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!("{}: {e}", self.spec.name);
                    ctx.property_error(
                        field,
                        Some(pattern.as_str()),
                        format!("Cannot resolve files that match pattern {pattern}: {e}"),
                    );
                }
            }
        }
        files
    }
}

impl Module for TestedBinaryModule {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn dynamic_dependencies(&self) -> Vec<String> {
        self.spec.deps.clone()
    }

    fn generate_build_actions(&self, ctx: &mut ModuleContext<'_>) {
        let name = self.spec.name.as_str();
        tracing::debug!("Adding build actions for go binary module '{name}'");

        let paths = ModulePaths::new(&ctx.config().base_output_dir, ctx.module_dir(), name);

        let excludes = self.compile_excludes(ctx);
        let build = self.resolve_all(ctx, "srcs", &self.spec.srcs, &excludes);
        let test = self.resolve_all(ctx, "testSrcs", &self.spec.test_srcs, &[]);
        if ctx.failed() {
            return;
        }

        for action in synthesize(&self.spec, &paths, ResolvedInputs { build, test }) {
            ctx.build(action);
        }
    }
}

/// Factory registered for [`TESTED_BINARY_TYPE`]
///
/// Binds the declared properties to a [`ModuleSpec`] and validates them.
pub fn tested_binary_factory(
    file: &str,
    properties: toml::Table,
) -> Result<Box<dyn Module>, DeclarationError> {
    let label = properties
        .get("name")
        .and_then(toml::Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();

    let spec: ModuleSpec =
        toml::Value::Table(properties)
            .try_into()
            .map_err(|e: toml::de::Error| DeclarationError::InvalidProperty {
                file: file.to_string(),
                module: label.clone(),
                message: e.message().to_string(),
            })?;

    spec.validate()
        .map_err(|errors| DeclarationError::InvalidProperty {
            file: file.to_string(),
            module: label,
            message: errors.join("; "),
        })?;

    Ok(Box::new(TestedBinaryModule::new(spec)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::Rule;
    use crate::infra::filesystem::MemoryFileSystem;

    fn app_fs() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file("main.go", "")
            .with_file("util.go", "")
            .with_file("util_test.go", "")
            .with_file("go.mod", "module app")
    }

    fn app_spec() -> ModuleSpec {
        ModuleSpec {
            name: "app".to_string(),
            pkg: ".".to_string(),
            test_pkg: "./...".to_string(),
            srcs: vec!["*.go".to_string()],
            test_srcs: vec!["*_test.go".to_string()],
            ..ModuleSpec::default()
        }
    }

    fn run(spec: ModuleSpec, fs: &MemoryFileSystem) -> ContextOutput {
        let config = GenConfig::new("out");
        let mut ctx = ModuleContext::new(&spec.name, ".", &config, fs);
        TestedBinaryModule::new(spec).generate_build_actions(&mut ctx);
        ctx.finish()
    }

    #[test]
    fn test_test_sources_never_reach_build_inputs() {
        let out = run(app_spec(), &app_fs());
        assert!(out.errors.is_empty());

        let build = out.actions.iter().find(|a| a.rule == Rule::Build).unwrap();
        assert_eq!(build.implicits, vec!["main.go", "util.go"]);

        let test = out.actions.iter().find(|a| a.rule == Rule::Test).unwrap();
        assert_eq!(test.implicits, vec!["util_test.go", "main.go", "util.go"]);
    }

    #[test]
    fn test_srcs_exclude_applies() {
        let spec = ModuleSpec {
            srcs_exclude: vec!["util.go".to_string()],
            ..app_spec()
        };
        let out = run(spec, &app_fs());
        let build = out.actions.iter().find(|a| a.rule == Rule::Build).unwrap();
        assert_eq!(build.implicits, vec!["main.go"]);
        assert!(out.glob_deps.contains(&"util.go".to_string()));
    }

    #[test]
    fn test_overlapping_patterns_are_deduplicated() {
        let spec = ModuleSpec {
            srcs: vec!["*.go".to_string(), "main.go".to_string()],
            ..app_spec()
        };
        let out = run(spec, &app_fs());
        let build = out.actions.iter().find(|a| a.rule == Rule::Build).unwrap();
        assert_eq!(build.implicits, vec!["main.go", "util.go"]);
    }

    #[test]
    fn test_every_failing_pattern_is_reported_and_nothing_registered() {
        let spec = ModuleSpec {
            srcs: vec!["missing/*.go".to_string(), "*.go".to_string()],
            test_srcs: vec!["nope/*_test.go".to_string()],
            ..app_spec()
        };
        let out = run(spec, &app_fs());

        assert!(out.actions.is_empty());
        let fields: Vec<&str> = out.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["srcs", "testSrcs"]);
        assert_eq!(out.errors[0].pattern.as_deref(), Some("missing/*.go"));
        assert!(out.errors[0]
            .message
            .contains("Cannot resolve files that match pattern missing/*.go"));
    }

    #[test]
    fn test_bad_exclusion_is_blamed_on_its_own_pattern() {
        let spec = ModuleSpec {
            srcs: vec!["main.go".to_string(), "util.go".to_string()],
            srcs_exclude: vec!["[x.go".to_string()],
            test_srcs: vec!["[x_test.go".to_string()],
            ..app_spec()
        };
        let out = run(spec, &app_fs());

        assert!(out.actions.is_empty());
        let blamed: Vec<(&str, Option<&str>)> = out
            .errors
            .iter()
            .map(|e| (e.field.as_str(), e.pattern.as_deref()))
            .collect();
        assert_eq!(
            blamed,
            vec![
                ("srcsExclude", Some("[x.go")),
                ("testSrcs", Some("[x_test.go")),
            ]
        );
    }

    #[test]
    fn test_nested_module_paths_are_root_relative() {
        let fs = MemoryFileSystem::new()
            .with_file("svc/api/main.go", "")
            .with_file("svc/api/main_test.go", "");
        let spec = ModuleSpec {
            name: "api".to_string(),
            vendor_first: true,
            ..app_spec()
        };
        let config = GenConfig::new("out");
        let mut ctx = ModuleContext::new("api", "svc/api", &config, &fs);
        TestedBinaryModule::new(spec).generate_build_actions(&mut ctx);
        let out = ctx.finish();

        let vendor = &out.actions[0];
        assert_eq!(vendor.outputs, vec!["svc/api/vendor"]);
        assert_eq!(vendor.implicits, vec!["svc/api/go.mod"]);
        assert_eq!(vendor.args["workDir"], "svc/api");

        let build = out.actions.last().unwrap();
        assert_eq!(build.implicits, vec!["svc/api/main.go", "svc/api/vendor"]);
    }

    #[test]
    fn test_dynamic_dependencies_are_deps_verbatim() {
        let spec = ModuleSpec {
            deps: vec!["zeta".to_string(), "alpha".to_string(), "zeta".to_string()],
            ..app_spec()
        };
        let module = TestedBinaryModule::new(spec);
        assert_eq!(module.dynamic_dependencies(), vec!["zeta", "alpha", "zeta"]);
    }

    #[test]
    fn test_factory_binds_camel_case_properties() {
        let table: toml::Table = toml::from_str(
            r#"
name = "test-out"
srcs = ["test-src.go"]
pkg = "."
testPkg = "./test-pkg"
testSrcs = ["./test-pkg/test-src_test.go"]
vendorFirst = true
optionalTest = true
"#,
        )
        .unwrap();
        let module = tested_binary_factory("modgraph.toml", table).unwrap();
        assert_eq!(module.name(), "test-out");
        assert!(module.dynamic_dependencies().is_empty());
    }

    #[test]
    fn test_factory_rejects_unknown_and_invalid_properties() {
        let unknown: toml::Table = toml::from_str("name = \"a\"\npkg = \".\"\nsrc = []").unwrap();
        let err = tested_binary_factory("modgraph.toml", unknown).unwrap_err();
        assert!(err.to_string().contains("src"));

        let invalid: toml::Table = toml::from_str("name = \"../a\"\npkg = \"\"").unwrap();
        let err = tested_binary_factory("modgraph.toml", invalid).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("not a valid module name"));
        assert!(message.contains("'pkg'"));
    }

    #[test]
    fn test_module_name_rules() {
        assert!(is_valid_module_name("app"));
        assert!(is_valid_module_name("test-out.v2_x"));
        assert!(!is_valid_module_name(""));
        assert!(!is_valid_module_name("-app"));
        assert!(!is_valid_module_name("a/b"));
        assert!(!is_valid_module_name(".."));
    }
}
