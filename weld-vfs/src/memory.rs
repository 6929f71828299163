//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// An in-memory file system implementation.
///
/// Files live in a `BTreeMap` keyed by their normalized path. Directories are
/// implicit (any ancestor of a stored file) or explicit (created through
/// `create_dir_all`), which is enough for module resolution and for writing
/// bundles in tests.
///
/// # Example
/// ```
/// use weld_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
/// let content = fs.read_file(Path::new("/test.txt")).unwrap();
/// assert_eq!(content, b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl Inner {
    fn is_dir(&self, normalized: &str) -> bool {
        if self.dirs.contains(normalized) {
            return true;
        }
        let prefix = if normalized.ends_with('/') {
            normalized.to_string()
        } else {
            format!("{}/", normalized)
        };
        self.files
            .range(prefix.clone()..)
            .next()
            .map(|(path, _)| path.starts_with(&prefix))
            .unwrap_or(false)
    }
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let fs = Self::new();
        if let Ok(mut inner) = fs.inner.write() {
            for (path, content) in files {
                let normalized = normalize_path(Path::new(path.as_ref()));
                inner.files.insert(normalized, content.into());
            }
        }
        fs
    }

    /// Paths of all stored files, in sorted order.
    pub fn paths(&self) -> Vec<String> {
        match self.inner.read() {
            Ok(inner) => inner.files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn read_guard(&self) -> VfsResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })
    }

    fn write_guard(&self) -> VfsResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })
    }
}

/// Normalize a path string for internal storage.
/// Uses forward slashes consistently and drops trailing separators.
fn normalize_path(path: &Path) -> String {
    let mut normalized = path.to_string_lossy().replace('\\', "/");
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

fn parent_of(normalized: &str) -> Option<&str> {
    match normalized.rfind('/') {
        Some(0) if normalized.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(idx) => Some(&normalized[..idx]),
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize_path(path);
        let inner = self.read_guard()?;

        inner
            .files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut inner = self.write_guard()?;
        if inner.is_dir(&normalized) {
            return Err(VfsError::AlreadyExists { path: normalized });
        }
        inner.files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut inner = self.write_guard()?;

        let mut current = Some(normalized.as_str());
        while let Some(dir) = current {
            if inner.files.contains_key(dir) {
                return Err(VfsError::AlreadyExists {
                    path: dir.to_string(),
                });
            }
            current = parent_of(dir);
        }
        inner.dirs.insert(normalized);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        match self.inner.read() {
            Ok(inner) => inner.files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        match self.inner.read() {
            Ok(inner) => inner.is_dir(&normalized),
            Err(_) => false,
        }
    }
}
