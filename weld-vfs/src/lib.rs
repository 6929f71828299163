//! Weld Virtual File System
//!
//! A virtual file system abstraction with multiple backend implementations.
//! The bundler reads modules and writes its output exclusively through
//! [`VirtualFileSystem`], so builds can run against the disk or fully in memory.
//!
//! # Usage
//! ```rust
//! use weld_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/src/index.js"), b"export const x = 1;").unwrap();
//! let source = fs.read_to_string(Path::new("/src/index.js")).unwrap();
//! assert!(fs.is_dir(Path::new("/src")));
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
