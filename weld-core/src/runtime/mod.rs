//! 运行时组装
//!
//! 把依赖图输出为单个自包含的 JavaScript 程序：每个模块包装成
//! `function (require, exports)`，存放在以模块标识符为键的表中，
//! 由闭包内的 `require` 按需执行并缓存导出对象。
//!
//! 缓存项在模块体执行之前写入，循环依赖因此能拿到尚未完成的导出对象；
//! 模块体抛出异常时缓存项被移除。

use thiserror::Error;
use tracing::{debug, info};
use weld_config::OutputConfig;

use crate::graph::DependencyGraph;
use crate::module::ModuleId;

/// 加载器模板
const LOADER: &str = include_str!("loader.js");
const ENTRY_MARKER: &str = "__WELD_ENTRY__";

/// 组装错误
#[derive(Debug, Error)]
pub enum AssembleError {
    /// 入口模块不在图中
    #[error("entry module '{entry}' is not in the dependency graph")]
    MissingEntry { entry: ModuleId },

    /// 图不闭合
    #[error("'{module}' imports '{specifier}' as '{target}', which is not in the dependency graph")]
    OpenGraph {
        module: ModuleId,
        specifier: String,
        target: ModuleId,
    },

    /// 模块表编码失败
    #[error("failed to encode module table: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 使用默认输出配置组装
pub fn assemble(graph: &DependencyGraph) -> Result<String, AssembleError> {
    assemble_with(graph, &OutputConfig::default())
}

/// 组装依赖图，返回输出程序文本
///
/// 输出结构：
/// ```text
/// (function (modules) { ...loader...; require("<entry>"); })({
///   "<id>": [function (require, exports) { <code> }, { "<raw>": "<id>" }],
/// });
/// ```
pub fn assemble_with(graph: &DependencyGraph, output: &OutputConfig) -> Result<String, AssembleError> {
    let entry = graph.entry();
    if !graph.contains(entry.as_str()) {
        return Err(AssembleError::MissingEntry {
            entry: entry.clone(),
        });
    }
    if let Some((module, specifier, target)) = graph.open_edges().next() {
        return Err(AssembleError::OpenGraph {
            module: module.clone(),
            specifier: specifier.to_string(),
            target: target.clone(),
        });
    }

    let mut out = String::new();
    if let Some(banner) = &output.banner {
        for line in banner.lines() {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
    }

    let entry_literal = serde_json::to_string(entry)?;
    out.push_str(&LOADER.trim_end().replace(ENTRY_MARKER, &entry_literal));
    out.push_str("({\n");

    let total = graph.len();
    for (index, record) in graph.iter().enumerate() {
        debug!(target: "weld::emit", module = %record.id(), bytes = record.code().len(), "emitting module");

        out.push_str(&serde_json::to_string(record.id())?);
        out.push_str(": [function (require, exports) {\n");
        if output.strict {
            out.push_str("\"use strict\";\n");
        }
        out.push_str(record.code());
        if !record.code().ends_with('\n') {
            out.push('\n');
        }
        out.push_str("}, ");
        out.push_str(&serde_json::to_string(&record.dependency_map())?);
        out.push(']');
        if index + 1 < total {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("});\n");

    info!(
        target: "weld::emit",
        entry = %entry,
        modules = total,
        bytes = out.len(),
        "bundle assembled"
    );
    Ok(out)
}
