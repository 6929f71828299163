//! 依赖图
//!
//! 从入口模块出发，以广度优先的方式收集所有可达模块。
//! 图按模块标识符去重：菱形依赖中的公共模块只处理一次，循环依赖正常终止。

mod builder;
mod record;

pub use builder::{BuildError, BuildErrorKind, GraphBuilder};
pub use record::{DependencyMap, ModuleRecord};

use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::module::ModuleId;

/// 依赖图
///
/// 保持模块的插入顺序（广度优先的发现顺序），输出因此是确定的。
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    entry: ModuleId,
    order: Vec<ModuleId>,
    modules: HashMap<ModuleId, ModuleRecord>,
}

impl DependencyGraph {
    /// 创建只有入口标识符的空图
    pub fn new(entry: ModuleId) -> Self {
        Self {
            entry,
            order: Vec::new(),
            modules: HashMap::new(),
        }
    }

    /// 插入模块记录，返回被替换的旧记录
    ///
    /// 替换不改变模块在图中的顺序。
    pub fn insert(&mut self, record: ModuleRecord) -> Option<ModuleRecord> {
        let id = record.id().clone();
        let previous = self.modules.insert(id.clone(), record);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn entry(&self) -> &ModuleId {
        &self.entry
    }

    pub fn get(&self, id: &str) -> Option<&ModuleRecord> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// 模块数量
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按插入顺序遍历模块记录
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.order.iter().filter_map(|id| self.modules.get(id))
    }

    /// 按插入顺序遍历模块标识符
    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.order.iter()
    }

    /// 依赖边总数
    pub fn edge_count(&self) -> usize {
        self.modules.values().map(|record| record.dependencies().len()).sum()
    }

    /// 指向图外模块的依赖边：(导入方, 原始 specifier, 目标)
    pub fn open_edges(&self) -> impl Iterator<Item = (&ModuleId, &str, &ModuleId)> {
        self.iter().flat_map(move |record| {
            record
                .dependencies()
                .iter()
                .filter(move |(_, target)| !self.contains(target.as_str()))
                .map(move |(specifier, target)| (record.id(), specifier.as_str(), target))
        })
    }

    /// 图是否闭合：每条依赖边的目标都在图中
    pub fn is_closed(&self) -> bool {
        self.open_edges().next().is_none()
    }
}

impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct GraphView<'a> {
            entry: &'a ModuleId,
            modules: Vec<&'a ModuleRecord>,
        }

        GraphView {
            entry: &self.entry,
            modules: self.iter().collect(),
        }
        .serialize(serializer)
    }
}
