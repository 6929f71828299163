//! 依赖图构建器

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, trace};
use weld_vfs::{VfsError, VirtualFileSystem};

use super::{DependencyGraph, ModuleRecord};
use crate::module::{ModuleId, ResolveError, Resolved, Resolver};
use crate::transform::{TransformError, Transformer};

/// 构建失败的底层原因
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildErrorKind {
    /// 模块文件读取失败
    #[error("cannot read module: {0}")]
    Read(VfsError),

    /// 转换器无法处理模块源码
    #[error("transform failed: {0}")]
    Transform(TransformError),

    /// import 无法解析到模块文件
    #[error("{0}")]
    Unresolved(ResolveError),
}

/// 图构建错误
///
/// 携带出错的模块标识符（入口本身无法解析时为 `None`）以及相关的 specifier。
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {kind}", Location(.module, .specifier))]
pub struct BuildError {
    pub module: Option<ModuleId>,
    pub specifier: Option<String>,
    #[source]
    pub kind: BuildErrorKind,
}

impl BuildError {
    fn new(module: &ModuleId, specifier: Option<&str>, kind: BuildErrorKind) -> Self {
        Self {
            module: Some(module.clone()),
            specifier: specifier.map(str::to_string),
            kind,
        }
    }

    /// 底层错误是否为文件缺失
    pub fn is_not_found(&self) -> bool {
        match &self.kind {
            BuildErrorKind::Read(err) => err.is_not_found(),
            BuildErrorKind::Unresolved(ResolveError::NotFound { .. }) => true,
            _ => false,
        }
    }
}

struct Location<'a>(&'a Option<ModuleId>, &'a Option<String>);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0, self.1) {
            (Some(module), Some(specifier)) => write!(f, "in '{}' (import '{}')", module, specifier),
            (Some(module), None) => write!(f, "in '{}'", module),
            (None, Some(entry)) => write!(f, "entry '{}'", entry),
            (None, None) => f.write_str("entry"),
        }
    }
}

/// 依赖图构建器
///
/// 工作队列 + 已访问集合，处理到不动点为止；每个模块标识符只转换一次。
pub struct GraphBuilder<'a> {
    fs: &'a dyn VirtualFileSystem,
    transformer: &'a dyn Transformer,
    resolver: Resolver<'a>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        fs: &'a dyn VirtualFileSystem,
        transformer: &'a dyn Transformer,
        resolver: Resolver<'a>,
    ) -> Self {
        Self {
            fs,
            transformer,
            resolver,
        }
    }

    /// 从入口路径构建（相对项目根，或位于项目根内的绝对路径）
    pub fn build_entry(&self, entry: &Path) -> Result<DependencyGraph, BuildError> {
        let resolved = self.resolver.resolve_entry(entry).map_err(|err| BuildError {
            module: None,
            specifier: Some(entry.display().to_string()),
            kind: BuildErrorKind::Unresolved(err),
        })?;
        self.build_resolved(resolved)
    }

    /// 从入口模块标识符构建
    pub fn build(&self, entry: &ModuleId) -> Result<DependencyGraph, BuildError> {
        self.build_resolved(self.resolver.resolved_of(entry))
    }

    fn build_resolved(&self, entry: Resolved) -> Result<DependencyGraph, BuildError> {
        let mut graph = DependencyGraph::new(entry.id.clone());
        let mut queued: HashSet<ModuleId> = HashSet::new();
        queued.insert(entry.id.clone());
        let mut queue = VecDeque::from([entry]);

        while let Some(module) = queue.pop_front() {
            if graph.contains(module.id.as_str()) {
                continue;
            }

            let record = self.load(&module, |target| {
                if queued.insert(target.id.clone()) {
                    queue.push_back(target.clone());
                }
            })?;
            graph.insert(record);
        }

        info!(
            target: "weld::graph",
            entry = %graph.entry(),
            modules = graph.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        Ok(graph)
    }

    /// 读取、转换单个模块并解析它的依赖
    fn load(&self, module: &Resolved, mut enqueue: impl FnMut(&Resolved)) -> Result<ModuleRecord, BuildError> {
        let id = &module.id;
        debug!(target: "weld::graph", module = %id, path = %module.path.display(), "visiting module");

        let source = self
            .fs
            .read_to_string(&module.path)
            .map_err(|err| BuildError::new(id, None, BuildErrorKind::Read(err)))?;

        let transformed = self
            .transformer
            .transform(&source, id)
            .map_err(|err| BuildError::new(id, None, BuildErrorKind::Transform(err)))?;

        let mut dependencies: Vec<(String, ModuleId)> =
            Vec::with_capacity(transformed.import_specifiers.len());
        for specifier in transformed.import_specifiers {
            if dependencies.iter().any(|(raw, _)| *raw == specifier) {
                continue;
            }

            let target = self
                .resolver
                .locate_from(&specifier, module)
                .map_err(|err| BuildError::new(id, Some(&specifier), BuildErrorKind::Unresolved(err)))?;
            trace!(
                target: "weld::graph",
                module = %id,
                specifier = %specifier,
                target_id = %target.id,
                "dependency edge"
            );

            enqueue(&target);
            dependencies.push((specifier, target.id));
        }

        Ok(ModuleRecord::new(id.clone(), transformed.code, dependencies))
    }
}
