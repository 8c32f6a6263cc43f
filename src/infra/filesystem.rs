//! Filesystem operations
//!
//! Handles file and directory operations. Glob resolution and declaration
//! loading go through the [`FileSystem`] trait so the core can run against
//! either the real project tree or an in-memory tree.
//!
//! Every path passed to or returned from a [`FileSystem`] is relative to the
//! filesystem root, `/`-separated, with `.` naming the root itself.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Result of walking a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Directories that were read, including the starting directory
    pub dirs: Vec<String>,
    /// Files found, sorted
    pub files: Vec<String>,
}

/// Read-only view of a project tree
pub trait FileSystem: Send + Sync {
    /// Whether `path` is an existing directory
    fn is_dir(&self, path: &str) -> bool;

    /// Whether `path` is an existing regular file
    fn is_file(&self, path: &str) -> bool;

    /// Read a file to a string
    fn read_to_string(&self, path: &str) -> Result<String, FilesystemError>;

    /// List files under `dir`
    ///
    /// `max_depth` counts path segments below `dir`: `Some(1)` lists only the
    /// direct children, `None` descends without limit.
    fn walk(&self, dir: &str, max_depth: Option<usize>) -> Result<Listing, FilesystemError>;
}

/// [`FileSystem`] backed by the real filesystem below a root directory
#[derive(Debug, Clone)]
pub struct OsFileSystem {
    root: PathBuf,
}

impl OsFileSystem {
    /// Create a view rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() || path == "." {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }
}

impl FileSystem for OsFileSystem {
    fn is_dir(&self, path: &str) -> bool {
        self.full_path(path).is_dir()
    }

    fn is_file(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }

    fn read_to_string(&self, path: &str) -> Result<String, FilesystemError> {
        read_file(&self.full_path(path))
    }

    fn walk(&self, dir: &str, max_depth: Option<usize>) -> Result<Listing, FilesystemError> {
        let start = self.full_path(dir);
        let mut walker = WalkDir::new(&start).sort_by_file_name();
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        let mut listing = Listing::default();
        for entry in walker {
            let entry = entry.map_err(|e| FilesystemError::Walk {
                path: start.clone(),
                error: e.to_string(),
            })?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                // Directories at the depth limit are not read
                if max_depth.map_or(true, |m| entry.depth() < m) {
                    listing.dirs.push(self.relative(entry.path()));
                }
            } else if file_type.is_file() || entry.path().is_file() {
                listing.files.push(self.relative(entry.path()));
            }
        }
        listing.files.sort();
        Ok(listing)
    }
}

/// In-memory [`FileSystem`]; directories exist implicitly through the files
/// below them
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<String, String>,
}

impl MemoryFileSystem {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    #[must_use]
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }

    /// Add a file
    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(normalize(path), content.to_string());
    }

    fn prefix(dir: &str) -> String {
        let dir = normalize(dir);
        if dir == "." {
            String::new()
        } else {
            format!("{dir}/")
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_dir(&self, path: &str) -> bool {
        let prefix = Self::prefix(path);
        prefix.is_empty() || self.files.keys().any(|f| f.starts_with(&prefix))
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }

    fn read_to_string(&self, path: &str) -> Result<String, FilesystemError> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| FilesystemError::ReadFile {
                path: PathBuf::from(path),
                error: "file not found".to_string(),
            })
    }

    fn walk(&self, dir: &str, max_depth: Option<usize>) -> Result<Listing, FilesystemError> {
        if !self.is_dir(dir) {
            return Err(FilesystemError::Walk {
                path: PathBuf::from(dir),
                error: "directory not found".to_string(),
            });
        }
        let prefix = Self::prefix(dir);
        let within = |depth: usize| max_depth.map_or(true, |m| depth < m);

        let mut dirs = BTreeSet::new();
        dirs.insert(normalize(dir));
        let mut files = Vec::new();

        for path in self.files.keys() {
            let Some(rel) = path.strip_prefix(&prefix) else {
                continue;
            };
            let segments: Vec<&str> = rel.split('/').collect();
            if max_depth.map_or(true, |m| segments.len() <= m) {
                files.push(path.clone());
            }
            for depth in 1..segments.len() {
                if within(depth) {
                    dirs.insert(format!("{prefix}{}", segments[..depth].join("/")));
                }
            }
        }

        Ok(Listing {
            dirs: dirs.into_iter().collect(),
            files,
        })
    }
}

/// Strip `./` prefixes and empty segments
fn normalize(path: &str) -> String {
    let parts: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
