//! Output formatting
//!
//! Decides what the user sees: plain status lines, machine-readable JSON,
//! or nothing but errors.

use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Print JSON instead of text
    pub json: bool,
    /// Verbosity level from `-v`
    pub verbose: u8,
}

impl OutputConfig {
    /// Create an output configuration from the global flags
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Print a line of human-readable output
    pub fn line(&self, message: impl AsRef<str>) {
        if !self.quiet && !self.json {
            println!("{}", message.as_ref());
        }
    }

    /// Print a status line with a prefix from [`status`]
    pub fn status(&self, prefix: &str, message: impl AsRef<str>) {
        self.line(format!("{prefix} {}", message.as_ref()));
    }

    /// Print a value as pretty JSON when `--json` is set
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }

    /// Report a problem on stderr, unless JSON output is requested
    pub fn problem(&self, message: impl AsRef<str>) {
        if !self.json {
            eprintln!("{} {}", status::ERROR, message.as_ref());
        }
    }

    /// Report a warning on stderr
    pub fn warning(&self, message: impl AsRef<str>) {
        if !self.quiet && !self.json {
            eprintln!("{} {}", status::WARNING, message.as_ref());
        }
    }
}

/// Print a top-level error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
