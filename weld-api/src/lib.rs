//! Weld API - Build orchestration layer
//!
//! Provides the unified bundling interface, including:
//! - Build flow orchestration (resolve → transform → graph → emit)
//! - Output naming and writing through the VFS
//! - Unified error handling (WeldError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `bundle(&config, fs)` API.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};
use weld_vfs::VirtualFileSystem;

// Re-export config
pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized};

// Re-export config types from weld_config
pub use weld_config::{BundleConfig, LogLevel, OutputConfig, Phase, ResolveConfig};

// Re-export error and types
pub mod error;
pub mod types;
pub use error::{ErrorReport, WeldError};
pub use types::BundleOutput;

// Re-export core types
pub use weld_config;
pub use weld_core::{
    assemble, assemble_with, AssembleError, BuildError, BuildErrorKind, DependencyGraph,
    EsmTransformer, GraphBuilder, ModuleId, ModuleRecord, ResolveError, Resolver, TransformError,
    Transformed, Transformer,
};
pub use weld_vfs;

/// Bundle with explicit configuration
///
/// This is the recommended API for library users.
pub fn bundle(config: &BundleConfig, fs: &dyn VirtualFileSystem) -> Result<BundleOutput, WeldError> {
    bundle_with(config, fs, &EsmTransformer::new())
}

/// Bundle with a custom transformer
pub fn bundle_with(
    config: &BundleConfig,
    fs: &dyn VirtualFileSystem,
    transformer: &dyn Transformer,
) -> Result<BundleOutput, WeldError> {
    info!(target: "weld::api", entry = %config.entry.display(), "Starting bundle");

    let graph = build_graph_with(config, fs, transformer)?;
    let code = assemble_with(&graph, &config.output)?;

    let path = if config.output.write {
        let path = output_path(config, graph.entry());
        write_output(fs, &path, &code)?;
        info!(target: "weld::emit", path = %path.display(), bytes = code.len(), "bundle written");
        Some(path)
    } else {
        None
    };

    info!(target: "weld::api", modules = graph.len(), "Bundle completed");
    Ok(BundleOutput { path, code, graph })
}

/// Build the dependency graph only
pub fn build_graph(config: &BundleConfig, fs: &dyn VirtualFileSystem) -> Result<DependencyGraph, WeldError> {
    build_graph_with(config, fs, &EsmTransformer::new())
}

fn build_graph_with(
    config: &BundleConfig,
    fs: &dyn VirtualFileSystem,
    transformer: &dyn Transformer,
) -> Result<DependencyGraph, WeldError> {
    let resolver = Resolver::new(fs, &config.root, config.resolve.clone());
    let graph = GraphBuilder::new(fs, transformer, resolver).build_entry(&config.entry)?;
    Ok(graph)
}

/// Output file path: `root/out_dir/filename` with placeholders expanded
///
/// - `[name]`: entry file stem
/// - `[timestamp]`: milliseconds since the Unix epoch
pub fn output_path(config: &BundleConfig, entry: &ModuleId) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let filename = render_filename(&config.output.filename, entry.stem(), timestamp);
    config.root.join(&config.output.out_dir).join(filename)
}

fn render_filename(template: &str, name: &str, timestamp: u128) -> String {
    template
        .replace("[name]", name)
        .replace("[timestamp]", &timestamp.to_string())
}

fn write_output(fs: &dyn VirtualFileSystem, path: &Path, code: &str) -> Result<(), WeldError> {
    let output_error = |source| WeldError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !fs.is_dir(dir) {
            debug!(target: "weld::emit", dir = %dir.display(), "creating output directory");
            fs.create_dir_all(dir).map_err(output_error)?;
        }
    }
    fs.write_file(path, code.as_bytes()).map_err(output_error)
}

// ==================== Global config API ====================

/// Bundle using the global config
pub fn bundle_global(fs: &dyn VirtualFileSystem) -> Result<BundleOutput, WeldError> {
    let config = get_config().ok_or_else(|| WeldError::Config("global config is not initialized".to_string()))?;
    bundle(config, fs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_vfs::MemoryFileSystem;

    fn project() -> MemoryFileSystem {
        MemoryFileSystem::with_files([
            ("/proj/src/main.js", "import { greet } from './greet.js';\ngreet('weld');"),
            ("/proj/src/greet.js", "export function greet(name) { return 'hi ' + name; }"),
        ])
    }

    #[test]
    fn test_bundle_writes_output() {
        let fs = project();
        let config = BundleConfig::new("/proj", "src/main.js");
        let output = bundle(&config, &fs).unwrap();

        assert_eq!(output.path, Some(PathBuf::from("/proj/dist/bundle.js")));
        assert_eq!(output.module_count(), 2);
        let written = fs.read_to_string(Path::new("/proj/dist/bundle.js")).unwrap();
        assert_eq!(written, output.code);
    }

    #[test]
    fn test_bundle_without_write() {
        let fs = project();
        let mut config = BundleConfig::new("/proj", "src/main.js");
        config.output.write = false;
        let output = bundle(&config, &fs).unwrap();

        assert!(output.path.is_none());
        assert!(!fs.exists(Path::new("/proj/dist")));
        assert!(output.code.contains("\"./src/greet.js\": [function"));
    }

    #[test]
    fn test_filename_placeholders() {
        assert_eq!(render_filename("[name].js", "main", 1), "main.js");
        assert_eq!(render_filename("bundle.[timestamp].js", "main", 1700000000000), "bundle.1700000000000.js");

        let mut config = BundleConfig::new("/proj", "src/main.js");
        config.output.out_dir = PathBuf::from("out/js");
        config.output.filename = "[name].bundle.js".to_string();
        let entry = ModuleId::new("src/main.js", true).unwrap();
        assert_eq!(output_path(&config, &entry), PathBuf::from("/proj/out/js/main.bundle.js"));
    }

    #[test]
    fn test_output_error() {
        let fs = project();
        fs.write_file(Path::new("/proj/dist"), b"not a directory").unwrap();
        let config = BundleConfig::new("/proj", "src/main.js");

        let err = bundle(&config, &fs).unwrap_err();
        assert!(matches!(err, WeldError::Output { .. }));
        assert_eq!(err.phase(), "emit");
    }

    #[test]
    fn test_build_error_propagates() {
        let fs = MemoryFileSystem::with_files([("/proj/main.js", "import './nope.js';")]);
        let config = BundleConfig::new("/proj", "main.js");

        let err = bundle(&config, &fs).unwrap_err();
        assert_eq!(err.error_kind(), "UnresolvedModuleError");
        assert!(!fs.exists(Path::new("/proj/dist/bundle.js")));
    }

    #[test]
    fn test_custom_transformer() {
        let fs = MemoryFileSystem::with_files([("/proj/main.txt", "plain")]);
        let mut config = BundleConfig::new("/proj", "main.txt");
        config.output.write = false;
        let upper = |source: &str, _: &ModuleId| -> Result<Transformed, TransformError> {
            Ok(Transformed {
                code: source.to_uppercase(),
                import_specifiers: Vec::new(),
            })
        };

        let output = bundle_with(&config, &fs, &upper).unwrap();
        assert!(output.code.contains("PLAIN"));
    }
}
