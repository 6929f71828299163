//! 项目文件
//!
//! 读取 `package.json`，并与命令行参数合并为 [`BundleConfig`]。

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use weld_config::{BundleConfig, LogLevel, ParseLogLevelError};
use weld_vfs::{VfsError, VirtualFileSystem};

/// package.json 结构
#[derive(Debug, Deserialize)]
pub struct PackageJson {
    /// 入口文件路径（相对项目文件所在目录）
    pub entry: String,
    /// 打包配置
    #[serde(default)]
    pub weld: WeldSection,
}

/// package.json 中的 `weld` 字段
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeldSection {
    pub out_dir: Option<PathBuf>,
    pub filename: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub case_sensitive: Option<bool>,
    pub resolve_index: Option<bool>,
    pub banner: Option<String>,
    pub strict: Option<bool>,
    /// 日志级别: "silent", "error", "warn", "info", "debug", "trace"
    pub log_level: Option<String>,
}

/// 命令行覆盖项
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub entry: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub filename: Option<String>,
    pub log_level: Option<LogLevel>,
    /// 输出到 stdout，不写文件
    pub stdout: bool,
}

/// 项目文件错误
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("'{}' not found; the current directory is not a weld project", path.display())]
    Missing { path: PathBuf },

    #[error("cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: VfsError },

    #[error("cannot parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("the 'entry' field in '{}' must not be empty", path.display())]
    EmptyEntry { path: PathBuf },

    #[error("invalid 'logLevel' in '{}': {source}", path.display())]
    LogLevel {
        path: PathBuf,
        source: ParseLogLevelError,
    },
}

impl ProjectError {
    /// 给用户的修复提示
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ProjectError::Missing { .. } => {
                Some("create a package.json with an \"entry\" field, or pass its path as the first argument")
            }
            ProjectError::EmptyEntry { .. } => Some("set \"entry\" to the module that starts the program, e.g. \"src/main.js\""),
            _ => None,
        }
    }
}

/// Read and parse package.json
pub fn read_package_json(fs: &dyn VirtualFileSystem, path: &Path) -> Result<PackageJson, ProjectError> {
    if !fs.is_file(path) {
        return Err(ProjectError::Missing {
            path: path.to_path_buf(),
        });
    }

    let content = fs.read_to_string(path).map_err(|source| ProjectError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let package: PackageJson = serde_json::from_str(&content).map_err(|source| ProjectError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if package.entry.trim().is_empty() {
        return Err(ProjectError::EmptyEntry {
            path: path.to_path_buf(),
        });
    }

    Ok(package)
}

/// Build bundle configuration from package.json and command line overrides
///
/// The project root is the directory containing the project file.
pub fn build_config(
    package_path: &Path,
    package: &PackageJson,
    overrides: &Overrides,
) -> Result<BundleConfig, ProjectError> {
    let root = match package_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let entry = overrides.entry.as_deref().unwrap_or(&package.entry);
    let mut config = BundleConfig::new(root, entry);
    let section = &package.weld;

    if let Some(extensions) = &section.extensions {
        config.resolve.extensions = extensions.clone();
    }
    if let Some(case_sensitive) = section.case_sensitive {
        config.resolve.case_sensitive = case_sensitive;
    }
    if let Some(resolve_index) = section.resolve_index {
        config.resolve.resolve_index = resolve_index;
    }

    if let Some(out_dir) = overrides.out_dir.as_ref().or(section.out_dir.as_ref()) {
        config.output.out_dir = out_dir.clone();
    }
    if let Some(filename) = overrides.filename.as_ref().or(section.filename.as_ref()) {
        config.output.filename = filename.clone();
    }
    config.output.banner = section.banner.clone();
    if let Some(strict) = section.strict {
        config.output.strict = strict;
    }
    config.output.write = !overrides.stdout;

    config.log_level = match (overrides.log_level, &section.log_level) {
        (Some(level), _) => level,
        (None, Some(level)) => level.parse().map_err(|source| ProjectError::LogLevel {
            path: package_path.to_path_buf(),
            source,
        })?,
        (None, None) => LogLevel::default(),
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_vfs::MemoryFileSystem;

    fn read(content: &str) -> Result<PackageJson, ProjectError> {
        let fs = MemoryFileSystem::with_files([("/proj/package.json", content)]);
        read_package_json(&fs, Path::new("/proj/package.json"))
    }

    #[test]
    fn test_minimal_package() {
        let package = read(r#"{ "name": "demo", "entry": "src/main.js" }"#).unwrap();
        let config = build_config(Path::new("/proj/package.json"), &package, &Overrides::default()).unwrap();

        assert_eq!(config.root, PathBuf::from("/proj"));
        assert_eq!(config.entry, PathBuf::from("src/main.js"));
        assert_eq!(config.output.out_dir, PathBuf::from("dist"));
        assert_eq!(config.output.filename, "bundle.js");
        assert!(config.output.write);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_weld_section() {
        let package = read(
            r#"{
                "entry": "index.mjs",
                "weld": {
                    "outDir": "build",
                    "filename": "bundle.[timestamp].js",
                    "extensions": [".mjs"],
                    "caseSensitive": false,
                    "banner": "(c) demo",
                    "strict": false,
                    "logLevel": "silent"
                }
            }"#,
        )
        .unwrap();
        let config = build_config(Path::new("/proj/package.json"), &package, &Overrides::default()).unwrap();

        assert_eq!(config.output.out_dir, PathBuf::from("build"));
        assert_eq!(config.output.filename, "bundle.[timestamp].js");
        assert_eq!(config.resolve.extensions, vec![".mjs"]);
        assert!(!config.resolve.case_sensitive);
        assert_eq!(config.output.banner.as_deref(), Some("(c) demo"));
        assert!(!config.output.strict);
        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn test_flags_override_file() {
        let package = read(r#"{ "entry": "a.js", "weld": { "outDir": "build", "logLevel": "debug" } }"#).unwrap();
        let overrides = Overrides {
            entry: Some("b.js".to_string()),
            out_dir: Some(PathBuf::from("out")),
            filename: Some("[name].js".to_string()),
            log_level: Some(LogLevel::Trace),
            stdout: true,
        };
        let config = build_config(Path::new("package.json"), &package, &overrides).unwrap();

        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.entry, PathBuf::from("b.js"));
        assert_eq!(config.output.out_dir, PathBuf::from("out"));
        assert_eq!(config.output.filename, "[name].js");
        assert_eq!(config.log_level, LogLevel::Trace);
        assert!(!config.output.write);
    }

    #[test]
    fn test_project_errors() {
        let fs = MemoryFileSystem::new();
        let missing = read_package_json(&fs, Path::new("/proj/package.json")).unwrap_err();
        assert!(matches!(missing, ProjectError::Missing { .. }));
        assert!(missing.hint().is_some());

        assert!(matches!(read("{ not json"), Err(ProjectError::Parse { .. })));
        assert!(matches!(read(r#"{ "entry": "" }"#), Err(ProjectError::EmptyEntry { .. })));
        assert!(matches!(read(r#"{ "version": "1.0.0" }"#), Err(ProjectError::Parse { .. })));

        let package = read(r#"{ "entry": "a.js", "weld": { "logLevel": "loud" } }"#).unwrap();
        let err = build_config(Path::new("/proj/package.json"), &package, &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("unknown log level 'loud'"));
    }
}
