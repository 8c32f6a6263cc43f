//! Per-module output path computation
//!
//! All paths are `/`-joined strings as handed to the build executor.

use crate::config::defaults::{
    BIN_SUBDIR, DEPENDENCY_MANIFEST, TEST_LOG_EXTENSION, TEST_SUBDIR, VENDOR_DIR,
};

/// Join path components, dropping empty and `.` components
///
/// Returns `.` when nothing remains.
pub fn join_path(parts: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        for segment in part.split('/') {
            if segment.is_empty() && i == 0 && out.is_empty() && part.starts_with('/') {
                // keep absolute roots
                out.push("");
                continue;
            }
            if segment.is_empty() || segment == "." {
                continue;
            }
            out.push(segment);
        }
    }
    match out.as_slice() {
        [] => ".".to_string(),
        [""] => "/".to_string(),
        _ => out.join("/"),
    }
}

/// Paths derived for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePaths {
    /// Directory the module was declared in
    pub module_dir: String,
    /// `<base>/bin/<name>`
    pub binary: String,
    /// `<base>/test/<name>.log`
    pub test_log: String,
    /// `<module-dir>/vendor`
    pub vendor_dir: String,
    /// `<module-dir>/go.mod`
    pub dependency_manifest: String,
}

impl ModulePaths {
    /// Compute the paths for module `name` declared in `module_dir`
    pub fn new(base_output_dir: &str, module_dir: &str, name: &str) -> Self {
        let log_name = format!("{name}.{TEST_LOG_EXTENSION}");
        Self {
            module_dir: join_path(&[module_dir]),
            binary: join_path(&[base_output_dir, BIN_SUBDIR, name]),
            test_log: join_path(&[base_output_dir, TEST_SUBDIR, &log_name]),
            vendor_dir: join_path(&[module_dir, VENDOR_DIR]),
            dependency_manifest: join_path(&[module_dir, DEPENDENCY_MANIFEST]),
        }
    }
}
