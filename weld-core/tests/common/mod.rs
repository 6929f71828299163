//! 测试辅助工具
//!
//! 提供内存项目、构建函数，以及一个按行声明依赖的简易转换器

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use weld_core::{
    BuildError, DependencyGraph, EsmTransformer, GraphBuilder, ModuleId, ResolveConfig, Resolver,
    TransformError, Transformed, Transformer,
};
use weld_vfs::MemoryFileSystem;

/// 测试项目根目录
pub const ROOT: &str = "/proj";

/// 在 [`ROOT`] 下创建内存项目，路径相对项目根
pub fn project(files: &[(&str, &str)]) -> MemoryFileSystem {
    MemoryFileSystem::with_files(
        files
            .iter()
            .map(|(path, source)| (format!("{}/{}", ROOT, path), source.to_string())),
    )
}

/// 使用内置 ES 模块转换器构建
pub fn build(fs: &MemoryFileSystem, entry: &str) -> Result<DependencyGraph, BuildError> {
    build_with(fs, &EsmTransformer::new(), entry)
}

pub fn build_with(
    fs: &MemoryFileSystem,
    transformer: &dyn Transformer,
    entry: &str,
) -> Result<DependencyGraph, BuildError> {
    let resolver = Resolver::new(fs, ROOT, ResolveConfig::default());
    GraphBuilder::new(fs, transformer, resolver).build_entry(Path::new(entry))
}

pub fn id(path: &str) -> ModuleId {
    ModuleId::new(path, true).unwrap()
}

/// 按行声明依赖的转换器：`dep <specifier>` 行视为 import，其余行原样输出
///
/// 记录每次调用的模块标识符，用于断言每个模块只被转换一次。
#[derive(Default)]
pub struct LineTransformer {
    pub calls: RefCell<Vec<String>>,
}

impl LineTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.borrow().iter().filter(|call| call.as_str() == id).count()
    }
}

impl Transformer for LineTransformer {
    fn transform(&self, source: &str, path: &ModuleId) -> Result<Transformed, TransformError> {
        self.calls.borrow_mut().push(path.to_string());

        let mut out = Transformed::default();
        for (index, line) in source.lines().enumerate() {
            if let Some(specifier) = line.strip_prefix("dep ") {
                if specifier.is_empty() {
                    return Err(TransformError::Syntax {
                        message: "empty specifier".to_string(),
                        line: index + 1,
                        column: 5,
                    });
                }
                if !out.import_specifiers.iter().any(|s| s == specifier) {
                    out.import_specifiers.push(specifier.to_string());
                }
            } else {
                out.code.push_str(line);
                out.code.push('\n');
            }
        }
        Ok(out)
    }
}
