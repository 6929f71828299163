//! API 类型定义

use std::path::PathBuf;

use weld_core::DependencyGraph;

/// 打包输出
#[derive(Debug, Clone)]
pub struct BundleOutput {
    /// 写出的文件路径（`write: false` 时为 `None`）
    pub path: Option<PathBuf>,
    /// 输出程序文本
    pub code: String,
    /// 构建得到的依赖图
    pub graph: DependencyGraph,
}

impl BundleOutput {
    /// 打包的模块数量
    pub fn module_count(&self) -> usize {
        self.graph.len()
    }
}
