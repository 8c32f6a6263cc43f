//! Infrastructure layer
//!
//! Handles filesystem access and platform directories.

pub mod dirs;
pub mod filesystem;
