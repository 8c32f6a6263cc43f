//! Integration tests for `modgraph deps`

mod common;

use common::{describe, TestProject};

const LAYERED: &str = r#"
[[go_tested_binary]]
name = "app"
pkg = "./cmd/app"
deps = ["svc"]

[[go_tested_binary]]
name = "svc"
pkg = "./cmd/svc"
deps = ["lib"]

[[go_tested_binary]]
name = "lib"
pkg = "./cmd/lib"

[[go_tested_binary]]
name = "tool"
pkg = "./cmd/tool"
"#;

#[test]
fn test_deps_lists_generation_order() {
    let project = TestProject::with_declarations(LAYERED);

    let output = project.run(&["--json", "deps"]);
    assert!(output.status.success(), "{}", describe(&output));

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["order"], serde_json::json!(["lib", "svc", "app", "tool"]));
}

#[test]
fn test_deps_for_one_module() {
    let project = TestProject::with_declarations(LAYERED);

    let output = project.run(&["--json", "deps", "app"]);
    assert!(output.status.success(), "{}", describe(&output));

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["order"], serde_json::json!(["lib", "svc"]));

    let output = project.run(&["--json", "deps", "lib"]);
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["dependents"], serde_json::json!(["svc"]));
}

#[test]
fn test_deps_dot_output() {
    let project = TestProject::with_declarations(LAYERED);

    let output = project.run(&["deps", "--dot"]);
    assert!(output.status.success(), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("digraph"));
    assert!(stdout.contains("\"svc\" -> \"lib\""));
}

#[test]
fn test_deps_unknown_module_fails() {
    let project = TestProject::with_declarations(LAYERED);

    let output = project.run(&["deps", "ghost"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'ghost' is not declared"), "{}", describe(&output));
}
