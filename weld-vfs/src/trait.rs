//! VirtualFileSystem trait definition

use crate::error::{VfsError, VfsResult};
use std::path::Path;

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling the bundler
/// from specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Returns
    /// File contents as bytes, or `VfsError::NotFound` if the file is missing
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Read file contents as UTF-8 text
    fn read_to_string(&self, path: &Path) -> VfsResult<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| VfsError::InvalidData {
            path: path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    /// The parent directory must already exist.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Create a directory and all of its missing parents
    ///
    /// Succeeds without changes when the directory already exists.
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path exists and is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;
}
