//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::{Path, PathBuf};

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access. Relative paths are resolved against an
/// optional base directory.
///
/// # Example
/// ```
/// use weld_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::new();
/// assert!(!fs.is_file(Path::new("/definitely/not/here.js")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {
    base: Option<PathBuf>,
}

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Create a new native file system with a base directory.
    ///
    /// Relative paths are joined onto `base`; absolute paths are used as-is.
    pub fn with_base(base: impl AsRef<Path>) -> Self {
        Self {
            base: Some(base.as_ref().to_path_buf()),
        }
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full = self.full_path(path);
        std::fs::read(&full).map_err(|e| VfsError::from_io(e, &full))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let full = self.full_path(path);
        std::fs::write(&full, content).map_err(|e| VfsError::from_io(e, &full))
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let full = self.full_path(path);
        std::fs::create_dir_all(&full).map_err(|e| VfsError::from_io(e, &full))
    }

    fn exists(&self, path: &Path) -> bool {
        self.full_path(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.full_path(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.full_path(path).is_dir()
    }
}
