//! Build action synthesis
//!
//! Turns a module's properties and resolved file sets into the ordered
//! vendor, test and build action descriptors handed to the executor.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::core::module::ModuleSpec;
use crate::core::paths::ModulePaths;

/// Static rule an action instantiates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rule {
    /// `go mod vendor`
    #[serde(rename = "vendor")]
    Vendor,
    /// `go test`, output captured to a log
    #[serde(rename = "test")]
    Test,
    /// `go build`
    #[serde(rename = "binaryBuild")]
    Build,
}

impl Rule {
    /// All rules, in emission order
    pub const ALL: [Rule; 3] = [Rule::Vendor, Rule::Test, Rule::Build];

    /// Rule identity
    pub fn name(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Test => "test",
            Self::Build => "binaryBuild",
        }
    }

    /// Command template; `$var` refers to an action argument
    pub fn command(self) -> &'static str {
        match self {
            Self::Vendor => "cd $workDir && go mod vendor",
            Self::Test => "cd $workDir && go test $testPkg > $outputPath",
            Self::Build => "cd $workDir && go build -o $outputPath $pkg",
        }
    }

    /// Description template
    pub fn description(self) -> &'static str {
        match self {
            Self::Vendor => "vendor dependencies of $name",
            Self::Test => "test package $testPkg",
            Self::Build => "build go command $pkg",
        }
    }

    /// Argument names every action of this rule carries
    pub fn args(self) -> &'static [&'static str] {
        match self {
            Self::Vendor => &["workDir", "name"],
            Self::Test => &["workDir", "testPkg", "outputPath"],
            Self::Build => &["workDir", "outputPath", "pkg"],
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of the build graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Rule this action instantiates
    pub rule: Rule,
    /// Human-readable description
    pub description: String,
    /// Files produced
    pub outputs: Vec<String>,
    /// Files whose change invalidates the outputs
    pub implicits: Vec<String>,
    /// Whether the executor may skip this action when nothing requests it
    pub optional: bool,
    /// Rule arguments
    pub args: BTreeMap<String, String>,
}

impl ActionDescriptor {
    /// Expand the rule's command template with this action's arguments
    ///
    /// Unknown variables expand to an empty string.
    pub fn command(&self) -> String {
        expand(self.rule.command(), &self.args)
    }

    /// Expand the rule's description template
    pub fn rule_description(&self) -> String {
        expand(self.rule.description(), &self.args)
    }
}

fn expand(template: &str, args: &BTreeMap<String, String>) -> String {
    static VAR: OnceLock<Regex> = OnceLock::new();
    let re = VAR.get_or_init(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));
    re.replace_all(template, |caps: &Captures<'_>| {
        args.get(&caps[1]).cloned().unwrap_or_default()
    })
    .into_owned()
}

/// Resolved file sets for one module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedInputs {
    /// Non-test sources
    pub build: Vec<String>,
    /// Test-only sources
    pub test: Vec<String>,
}

fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Build the action descriptors for one module
///
/// Order is vendor (when `vendorFirst`), test (when `testPkg` is set), then
/// build. The vendor directory becomes an implicit input of test and build.
pub fn synthesize(
    spec: &ModuleSpec,
    paths: &ModulePaths,
    inputs: ResolvedInputs,
) -> Vec<ActionDescriptor> {
    let name = spec.name.as_str();
    let work_dir = paths.module_dir.as_str();
    let ResolvedInputs {
        build: mut build_inputs,
        test: test_inputs,
    } = inputs;
    let mut actions = Vec::with_capacity(3);

    if spec.vendor_first {
        actions.push(ActionDescriptor {
            rule: Rule::Vendor,
            description: format!("Vendor dependencies of {name}"),
            outputs: vec![paths.vendor_dir.clone()],
            implicits: vec![paths.dependency_manifest.clone()],
            optional: spec.optional_vendor,
            args: args(&[("workDir", work_dir), ("name", name)]),
        });
        build_inputs.push(paths.vendor_dir.clone());
    }

    if !spec.test_pkg.is_empty() {
        let mut implicits = test_inputs;
        implicits.extend(build_inputs.iter().cloned());
        actions.push(ActionDescriptor {
            rule: Rule::Test,
            description: format!("Execute and write tests for {name} package"),
            outputs: vec![paths.test_log.clone()],
            implicits,
            optional: spec.optional_test,
            args: args(&[
                ("workDir", work_dir),
                ("testPkg", spec.test_pkg.as_str()),
                ("outputPath", paths.test_log.as_str()),
            ]),
        });
    }

    actions.push(ActionDescriptor {
        rule: Rule::Build,
        description: format!("Build {name} as Go binary"),
        outputs: vec![paths.binary.clone()],
        implicits: build_inputs,
        optional: spec.optional_build,
        args: args(&[
            ("workDir", work_dir),
            ("outputPath", paths.binary.as_str()),
            ("pkg", spec.pkg.as_str()),
        ]),
    });

    actions
}
