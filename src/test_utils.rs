//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid module name
    pub fn module_name() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9_.-]{0,20}"
    }

    /// Generate a Go source file name, test files included
    pub fn go_file_name() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9_]{0,10}", any::<bool>()).prop_map(|(stem, test)| {
            if test {
                format!("{stem}_test.go")
            } else {
                format!("{stem}.go")
            }
        })
    }

    /// Generate a relative directory path of up to three segments
    pub fn relative_dir() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,6}", 0..3).prop_map(|parts| {
            if parts.is_empty() {
                ".".to_string()
            } else {
                parts.join("/")
            }
        })
    }

    /// Generate a Go package path as written in `pkg` / `testPkg`
    pub fn go_package() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(".".to_string()),
            Just("./...".to_string()),
            "[a-z]{1,8}".prop_map(|p| format!("./cmd/{p}")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use crate::core::module::is_valid_module_name;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_module_name_generator(name in module_name()) {
            prop_assert!(is_valid_module_name(&name));
        }

        #[test]
        fn test_go_file_name_generator(name in go_file_name()) {
            prop_assert!(name.ends_with(".go"));
            prop_assert!(!name.contains('/'));
        }

        #[test]
        fn test_relative_dir_generator(dir in relative_dir()) {
            prop_assert!(!dir.starts_with('/'));
            prop_assert!(!dir.split('/').any(|s| s == ".."));
        }
    }
}
