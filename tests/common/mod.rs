//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use assert_fs::prelude::*;
use assert_fs::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a project with a Go module and the given declarations
    pub fn with_declarations(declarations: &str) -> Self {
        let project = Self::new();
        project.create_file("modgraph.toml", declarations);
        project.create_file("go.mod", "module example.com/app\n\ngo 1.22\n");
        project.create_file("main.go", "package main\n\nfunc main() {}\n");
        project.create_file("util.go", "package main\n");
        project.create_file("util_test.go", "package main\n");
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        self.dir
            .child(name)
            .write_str(content)
            .expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        self.dir
            .child(name)
            .create_dir_all()
            .expect("Failed to create directory");
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Run modgraph in the project directory
    ///
    /// The user config directory points inside the project so the host's
    /// configuration never leaks into a test.
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute modgraph")
    }

    /// Command for modgraph with an isolated environment
    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_modgraph"));
        cmd.current_dir(self.dir.path())
            .env("MODGRAPH_CONFIG_DIR", self.dir.path().join(".user-config"))
            .env_remove("MODGRAPH_OUTPUT_DIR")
            .env_remove("MODGRAPH_DEBUG")
            .env_remove("RUST_LOG")
            .arg("-C")
            .arg(self.dir.path())
            .args(args);
        cmd
    }

    /// Parse the graph written to `path`
    pub fn graph(&self, path: &str) -> serde_json::Value {
        serde_json::from_str(&self.read_file(path)).expect("Graph is not valid JSON")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdout and stderr of a run, for assertion messages
pub fn describe(output: &Output) -> String {
    format!(
        "stdout={}, stderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// Absolute path inside the project as the graph spells it
pub fn project_path(project: &TestProject, relative: &str) -> String {
    project
        .path()
        .join(relative)
        .to_string_lossy()
        .into_owned()
}

/// A module with tests and a vendoring step
pub const VENDORED_APP: &str = r#"
[[go_tested_binary]]
name = "app"
pkg = "."
testPkg = "./..."
srcs = ["*.go"]
testSrcs = ["*_test.go"]
vendorFirst = true
"#;

/// A module without tests or vendoring
pub const PLAIN_APP: &str = r#"
[[go_tested_binary]]
name = "app"
pkg = "."
srcs = ["*.go"]
srcsExclude = ["*_test.go"]
"#;
