//! 模块解析器
//!
//! 将 import 的原始 specifier 解析为规范化的 [`ModuleId`]。
//!
//! # 解析规则
//! - 只支持相对 specifier（`./`、`../`），相对于导入方所在目录
//! - 规范化后精确命中文件则直接使用
//! - 否则依次尝试追加扩展名（`./util` → `./util.js`），再尝试目录索引
//!   （`./lib` → `./lib/index.js`）
//! - 越出项目根目录的路径视为解析失败

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;
use weld_config::ResolveConfig;
use weld_vfs::VirtualFileSystem;

use super::id::{clean_relative, join_relative, ModuleId};

/// 模块解析错误（unresolved module）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// 非相对 specifier（裸模块名、绝对路径、URL 等）
    #[error("unsupported specifier '{specifier}' in '{from}': only relative imports ('./', '../') are supported")]
    UnsupportedSpecifier { specifier: String, from: String },

    /// 规范化后越出项目根目录
    #[error("'{specifier}' imported from '{from}' escapes the project root")]
    EscapesRoot { specifier: String, from: String },

    /// 没有可读取的模块文件
    #[error("cannot resolve '{specifier}' from '{from}'; tried: {}", format_tried(.tried))]
    NotFound {
        specifier: String,
        from: String,
        /// 尝试过的文件路径
        tried: Vec<PathBuf>,
    },
}

fn format_tried(tried: &[PathBuf]) -> String {
    tried
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 入口模块在错误信息中的导入方名称
const ENTRY_IMPORTER: &str = "<entry>";

/// 解析结果：模块标识符以及用于读取的实际路径
///
/// 大小写不敏感模式下标识符会被小写化，读取和继续解析相对 import
/// 时仍使用命中的原始路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub id: ModuleId,
    pub path: PathBuf,
    /// 命中的项目根相对路径（保留大小写，不带 `./`）
    pub relative: String,
}

impl Resolved {
    /// 命中文件所在目录（相对路径，根目录为空串）
    pub fn dir(&self) -> &str {
        match self.relative.rfind('/') {
            Some(idx) => &self.relative[..idx],
            None => "",
        }
    }
}

enum ProbeFailure {
    Escapes,
    Missing(Vec<PathBuf>),
}

/// 模块解析器
pub struct Resolver<'fs> {
    /// 虚拟文件系统
    fs: &'fs dyn VirtualFileSystem,
    /// 项目根目录（所有模块标识符基于此）
    root: PathBuf,
    config: ResolveConfig,
}

impl<'fs> Resolver<'fs> {
    /// 创建新的模块解析器
    ///
    /// # Arguments
    /// * `fs` - 虚拟文件系统
    /// * `root` - 项目根目录
    /// * `config` - 解析配置
    pub fn new(fs: &'fs dyn VirtualFileSystem, root: impl Into<PathBuf>, config: ResolveConfig) -> Self {
        Self {
            fs,
            root: root.into(),
            config,
        }
    }

    /// 标识符对应的解析结果（不做探测）
    pub fn resolved_of(&self, id: &ModuleId) -> Resolved {
        Resolved {
            id: id.clone(),
            path: self.root.join(id.relative_path()),
            relative: id.relative_path().to_string(),
        }
    }

    /// 是否为受支持的相对 specifier
    pub fn is_relative(specifier: &str) -> bool {
        specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == ".."
    }

    /// 解析 specifier，返回模块标识符
    pub fn resolve(&self, specifier: &str, from: &ModuleId) -> Result<ModuleId, ResolveError> {
        self.locate(specifier, from).map(|resolved| resolved.id)
    }

    /// 解析 specifier，返回标识符和命中的文件路径
    ///
    /// 相对于标识符所在目录解析；大小写不敏感模式下请使用
    /// [`Resolver::locate_from`]，标识符已被小写化。
    pub fn locate(&self, specifier: &str, from: &ModuleId) -> Result<Resolved, ResolveError> {
        self.locate_in(specifier, from.dir(), from)
    }

    /// 相对于导入方命中的真实路径解析 specifier
    pub fn locate_from(&self, specifier: &str, importer: &Resolved) -> Result<Resolved, ResolveError> {
        self.locate_in(specifier, importer.dir(), &importer.id)
    }

    fn locate_in(&self, specifier: &str, dir: &str, from: &ModuleId) -> Result<Resolved, ResolveError> {
        if !Self::is_relative(specifier) {
            return Err(ResolveError::UnsupportedSpecifier {
                specifier: specifier.to_string(),
                from: from.to_string(),
            });
        }

        let joined = join_relative(dir, specifier);
        let resolved = self
            .probe(&joined)
            .map_err(|failure| failure.into_error(specifier, from.as_str()))?;

        trace!(
            target: "weld::resolve",
            specifier,
            from = %from,
            id = %resolved.id,
            "resolved import"
        );
        Ok(resolved)
    }

    /// 解析入口模块
    ///
    /// 入口可以是项目根相对路径，也可以是位于项目根目录内的绝对路径。
    pub fn resolve_entry(&self, entry: &Path) -> Result<Resolved, ResolveError> {
        let entry_text = entry.display().to_string();
        let relative = if entry.is_absolute() {
            entry
                .strip_prefix(&self.root)
                .map_err(|_| ResolveError::EscapesRoot {
                    specifier: entry_text.clone(),
                    from: ENTRY_IMPORTER.to_string(),
                })?
        } else {
            entry
        };

        let resolved = self
            .probe(&relative.to_string_lossy())
            .map_err(|failure| failure.into_error(&entry_text, ENTRY_IMPORTER))?;

        trace!(target: "weld::resolve", entry = %entry_text, id = %resolved.id, "resolved entry");
        Ok(resolved)
    }

    /// 依次尝试候选路径，返回第一个存在的文件
    fn probe(&self, relative: &str) -> Result<Resolved, ProbeFailure> {
        let base = clean_relative(relative).ok_or(ProbeFailure::Escapes)?;

        let mut candidates = vec![base.clone()];
        for ext in &self.config.extensions {
            candidates.push(format!("{}{}", base, ext));
        }
        if self.config.resolve_index {
            for ext in &self.config.extensions {
                candidates.push(format!("{}/index{}", base, ext));
            }
        }

        let mut tried = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let path = self.root.join(&candidate);
            if self.fs.is_file(&path) {
                return Ok(Resolved {
                    id: ModuleId::from_clean(candidate.clone(), self.config.case_sensitive),
                    path,
                    relative: candidate,
                });
            }
            tried.push(path);
        }

        Err(ProbeFailure::Missing(tried))
    }
}

impl ProbeFailure {
    fn into_error(self, specifier: &str, from: &str) -> ResolveError {
        match self {
            ProbeFailure::Escapes => ResolveError::EscapesRoot {
                specifier: specifier.to_string(),
                from: from.to_string(),
            },
            ProbeFailure::Missing(tried) => ResolveError::NotFound {
                specifier: specifier.to_string(),
                from: from.to_string(),
                tried,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_vfs::MemoryFileSystem;

    fn create_test_fs() -> MemoryFileSystem {
        MemoryFileSystem::with_files([
            ("/proj/src/index.js", ""),
            ("/proj/src/util.js", ""),
            ("/proj/src/lib/math.mjs", ""),
            ("/proj/src/widgets/index.js", ""),
            ("/proj/shared.js", ""),
        ])
    }

    fn id(path: &str) -> ModuleId {
        ModuleId::new(path, true).unwrap()
    }

    #[test]
    fn test_resolve_sibling() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());

        let resolved = resolver.resolve("./util.js", &id("src/index.js")).unwrap();
        assert_eq!(resolved.as_str(), "./src/util.js");
    }

    #[test]
    fn test_resolve_parent_directory() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());

        let resolved = resolver.locate("../shared.js", &id("src/index.js")).unwrap();
        assert_eq!(resolved.id.as_str(), "./shared.js");
        assert_eq!(resolved.path, PathBuf::from("/proj/shared.js"));
    }

    #[test]
    fn test_distinct_specifiers_same_id() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());

        let from_index = resolver.resolve("./util.js", &id("src/index.js")).unwrap();
        let from_lib = resolver.resolve("../util", &id("src/lib/math.mjs")).unwrap();
        let roundabout = resolver
            .resolve("./lib/../././util.js", &id("src/index.js"))
            .unwrap();

        assert_eq!(from_index, from_lib);
        assert_eq!(from_index, roundabout);
    }

    #[test]
    fn test_extension_and_index_probing() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());
        let from = id("src/index.js");

        assert_eq!(resolver.resolve("./lib/math", &from).unwrap().as_str(), "./src/lib/math.mjs");
        assert_eq!(resolver.resolve("./widgets", &from).unwrap().as_str(), "./src/widgets/index.js");
    }

    #[test]
    fn test_index_probing_disabled() {
        let fs = create_test_fs();
        let config = ResolveConfig {
            resolve_index: false,
            ..ResolveConfig::default()
        };
        let resolver = Resolver::new(&fs, "/proj", config);

        let result = resolver.resolve("./widgets", &id("src/index.js"));
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    }

    #[test]
    fn test_bare_specifier_unsupported() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());

        for specifier in ["lodash", "/proj/src/util.js", "https://x.dev/a.js"] {
            let result = resolver.resolve(specifier, &id("src/index.js"));
            assert!(
                matches!(result, Err(ResolveError::UnsupportedSpecifier { .. })),
                "{} should be rejected",
                specifier
            );
        }
    }

    #[test]
    fn test_escaping_root() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());

        let result = resolver.resolve("../../etc/passwd", &id("src/index.js"));
        assert!(matches!(result, Err(ResolveError::EscapesRoot { .. })));
    }

    #[test]
    fn test_not_found_reports_candidates() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());

        let err = resolver.resolve("./missing", &id("src/index.js")).unwrap_err();
        match &err {
            ResolveError::NotFound { tried, .. } => {
                assert_eq!(tried.len(), 5);
                assert_eq!(tried[0], PathBuf::from("/proj/src/missing"));
                assert_eq!(tried[1], PathBuf::from("/proj/src/missing.js"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("/proj/src/missing.mjs"));
    }

    #[test]
    fn test_resolve_entry() {
        let fs = create_test_fs();
        let resolver = Resolver::new(&fs, "/proj", ResolveConfig::default());

        let relative = resolver.resolve_entry(Path::new("./src/index.js")).unwrap();
        let absolute = resolver.resolve_entry(Path::new("/proj/src/index.js")).unwrap();
        let probed = resolver.resolve_entry(Path::new("src/index")).unwrap();

        assert_eq!(relative.id.as_str(), "./src/index.js");
        assert_eq!(relative, absolute);
        assert_eq!(relative, probed);

        let outside = resolver.resolve_entry(Path::new("/elsewhere/index.js"));
        assert!(matches!(outside, Err(ResolveError::EscapesRoot { .. })));
    }

    #[test]
    fn test_case_insensitive_ids() {
        let fs = MemoryFileSystem::with_files([("/proj/src/Util.js", ""), ("/proj/src/index.js", "")]);
        let config = ResolveConfig {
            case_sensitive: false,
            ..ResolveConfig::default()
        };
        let resolver = Resolver::new(&fs, "/proj", config);

        let resolved = resolver.locate("./Util.js", &id("src/index.js")).unwrap();
        assert_eq!(resolved.id.as_str(), "./src/util.js");
        // 读取使用命中的真实路径
        assert_eq!(resolved.path, PathBuf::from("/proj/src/Util.js"));
        assert_eq!(resolved.relative, "src/Util.js");
    }

    #[test]
    fn test_case_insensitive_nested_imports() {
        let fs = MemoryFileSystem::with_files([
            ("/proj/main.js", ""),
            ("/proj/Lib/a.js", ""),
            ("/proj/Lib/b.js", ""),
        ]);
        let config = ResolveConfig {
            case_sensitive: false,
            ..ResolveConfig::default()
        };
        let resolver = Resolver::new(&fs, "/proj", config);

        let entry = resolver.resolve_entry(Path::new("main.js")).unwrap();
        let a = resolver.locate_from("./Lib/a.js", &entry).unwrap();
        assert_eq!(a.id.as_str(), "./lib/a.js");
        assert_eq!(a.dir(), "Lib");

        let b = resolver.locate_from("./b.js", &a).unwrap();
        assert_eq!(b.id.as_str(), "./lib/b.js");
        assert_eq!(b.path, PathBuf::from("/proj/Lib/b.js"));
    }
}
