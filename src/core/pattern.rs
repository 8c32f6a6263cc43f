//! Glob pattern resolution
//!
//! Expands source patterns against a [`FileSystem`] relative to a module
//! directory, subtracting exclusion patterns. Patterns are translated to
//! anchored regular expressions over module-relative paths:
//!
//! - `*` matches any run of characters within one path segment
//! - `?` matches one character other than `/`
//! - `[abc]`, `[a-z]`, `[!abc]` match character classes
//! - `**` as a whole segment matches zero or more directories
//!
//! The segments before the first wildcard form the literal directory that
//! is walked; it must exist. A pattern that matches nothing in an existing
//! directory resolves to an empty list.

use std::collections::HashSet;

use regex::Regex;

use crate::core::paths::join_path;
use crate::error::PatternError;
use crate::infra::filesystem::FileSystem;

/// Files matched by one pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobMatches {
    /// Matching files not removed by an exclusion, relative to the module directory
    pub files: Vec<String>,
    /// Paths examined while resolving, relative to the filesystem root
    ///
    /// Includes every directory read and every file the pattern matched,
    /// excluded or not.
    pub deps: Vec<String>,
}

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    segments: Vec<String>,
    literal_len: usize,
    recursive: bool,
    regex: Regex,
}

impl Glob {
    /// Compile a pattern
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let invalid = |reason: &str| PatternError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if trimmed.starts_with('/') {
            return Err(invalid("absolute patterns are not allowed"));
        }

        let segments: Vec<String> = trimmed
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(invalid("pattern names no files"));
        }
        if segments.iter().any(|s| s == "..") {
            return Err(invalid("'..' segments are not allowed"));
        }

        let literal_len = segments
            .iter()
            .position(|s| has_wildcard(s))
            .unwrap_or(segments.len());

        let mut expr = String::from("^");
        let last = segments.len() - 1;
        let mut recursive = false;
        for (i, segment) in segments.iter().enumerate() {
            if segment == "**" {
                recursive = true;
                if i == last {
                    expr.push_str(".*");
                } else {
                    expr.push_str("(?:[^/]+/)*");
                }
                continue;
            }
            if segment.contains("**") {
                return Err(invalid("'**' must be a whole path segment"));
            }
            expr.push_str(&translate_segment(segment).map_err(|reason| invalid(&reason))?);
            if i != last {
                expr.push('/');
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            literal_len,
            recursive,
            regex,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern contains no wildcard at all
    pub fn is_literal(&self) -> bool {
        self.literal_len == self.segments.len()
    }

    /// Whether a module-relative path matches
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Directory that must be read to resolve the pattern, module-relative
    fn literal_dir(&self) -> String {
        let len = if self.is_literal() {
            self.literal_len - 1
        } else {
            self.literal_len
        };
        let parts: Vec<&str> = self.segments[..len].iter().map(String::as_str).collect();
        join_path(&parts)
    }

    /// Walk depth below the literal directory
    fn walk_depth(&self) -> Option<usize> {
        if self.recursive {
            None
        } else {
            Some(self.segments.len() - self.literal_len)
        }
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// Translate one path segment to a regex fragment
fn translate_segment(segment: &str) -> Result<String, String> {
    let mut out = String::new();
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let mut class = String::from("[");
                if matches!(chars.peek(), Some('!' | '^')) {
                    chars.next();
                    class.push('^');
                }
                let mut first = true;
                let mut closed = false;
                for c in chars.by_ref() {
                    match c {
                        ']' if !first => {
                            closed = true;
                            break;
                        }
                        '\\' | '[' | ']' | '^' | '&' | '~' => {
                            class.push('\\');
                            class.push(c);
                        }
                        _ => class.push(c),
                    }
                    first = false;
                }
                if !closed {
                    return Err("unclosed character class".to_string());
                }
                class.push(']');
                out.push_str(&class);
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }

    Ok(out)
}

/// Resolve `pattern` in `module_dir`, dropping files that match any of
/// `excludes`
///
/// Exclusion patterns are compiled (and so syntax-checked) but never walked.
pub fn resolve_glob(
    fs: &dyn FileSystem,
    module_dir: &str,
    pattern: &str,
    excludes: &[String],
) -> Result<GlobMatches, PatternError> {
    let glob = Glob::compile(pattern)?;
    let excludes = excludes
        .iter()
        .map(|p| Glob::compile(p))
        .collect::<Result<Vec<_>, _>>()?;
    resolve_compiled(fs, module_dir, &glob, &excludes)
}

/// Resolve an already compiled `glob` in `module_dir`, dropping files that
/// match any of `excludes`
pub fn resolve_compiled(
    fs: &dyn FileSystem,
    module_dir: &str,
    glob: &Glob,
    excludes: &[Glob],
) -> Result<GlobMatches, PatternError> {
    let pattern = glob.as_str();
    let excluded = |rel: &str| excludes.iter().any(|g| g.is_match(rel));

    let module_dir = join_path(&[module_dir]);
    let base = join_path(&[&module_dir, &glob.literal_dir()]);
    if !fs.is_dir(&base) {
        return Err(PatternError::MissingDirectory {
            pattern: pattern.to_string(),
            dir: base,
        });
    }

    let mut matches = GlobMatches::default();

    if glob.is_literal() {
        let rel = glob.segments.join("/");
        let path = join_path(&[&module_dir, &rel]);
        matches.deps.push(base);
        if fs.is_file(&path) {
            matches.deps.push(path);
            if !excluded(&rel) {
                matches.files.push(rel);
            }
        }
        return Ok(matches);
    }

    let listing = fs
        .walk(&base, glob.walk_depth())
        .map_err(|e| PatternError::ReadFailed {
            pattern: pattern.to_string(),
            path: base.clone(),
            error: e.to_string(),
        })?;
    matches.deps.extend(listing.dirs);

    let prefix = if module_dir == "." {
        String::new()
    } else {
        format!("{module_dir}/")
    };
    let mut seen = HashSet::new();
    for file in listing.files {
        let Some(rel) = file.strip_prefix(&prefix) else {
            continue;
        };
        if !glob.is_match(rel) || !seen.insert(rel.to_string()) {
            continue;
        }
        if !excluded(rel) {
            matches.files.push(rel.to_string());
        }
        matches.deps.push(file);
    }

    Ok(matches)
}
