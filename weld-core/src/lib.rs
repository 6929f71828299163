//! Weld Core - bundler core (pure logic, I/O through the VFS only)
//!
//! Pipeline:
//!
//! ```text
//! entry path ─▶ Resolver ─▶ GraphBuilder ─(Transformer, Resolver)*─▶ DependencyGraph
//!                                                                        │
//!                                             bundle text ◀─ assemble ◀──┘
//! ```
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod graph;
mod js;
pub mod module;
pub mod runtime;
pub mod transform;

pub use graph::{BuildError, BuildErrorKind, DependencyGraph, GraphBuilder, ModuleRecord};
pub use module::{ModuleId, Resolved, ResolveError, Resolver};
pub use runtime::{assemble, assemble_with, AssembleError};
pub use transform::{EsmTransformer, TransformError, Transformed, Transformer};

// Re-export config types from weld-config
pub use weld_config::{OutputConfig, Phase, ResolveConfig};
