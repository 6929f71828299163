//! Weld - a static-import JavaScript bundler
//!
//! Follows relative `import` statements from an entry module, builds a closed
//! dependency graph and emits one self-contained script with a small
//! `require`/`exports` runtime.
//!
//! # Architecture
//!
//! ```text
//! weld-config  - configuration data (no logic)
//! weld-vfs     - file system abstraction (native / in-memory)
//! weld-core    - resolver, transformer, graph builder, runtime assembler
//! weld-api     - orchestration, output writing, unified errors
//! weld-cli     - the `weld` binary
//! ```
//!
//! # Quick Start
//!
//! ```
//! use weld_workspace::{bundle, BundleConfig};
//! use weld_workspace::weld_vfs::MemoryFileSystem;
//!
//! let fs = MemoryFileSystem::with_files([
//!     ("/app/main.js", "import { twice } from './math.js';\nconsole.log(twice(21));"),
//!     ("/app/math.js", "export const twice = (n) => n * 2;"),
//! ]);
//! let mut config = BundleConfig::new("/app", "main.js");
//! config.output.write = false;
//!
//! let output = bundle(&config, &fs).unwrap();
//! assert_eq!(output.module_count(), 2);
//! assert!(output.code.contains("\"./math.js\": [function (require, exports)"));
//! ```

pub use weld_api::*;
