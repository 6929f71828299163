//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use weld_config::Phase;
use weld_core::{AssembleError, BuildError, BuildErrorKind, ResolveError, TransformError};
use weld_vfs::VfsError;

/// Weld 错误类型
#[derive(Error, Debug)]
pub enum WeldError {
    /// 依赖图构建错误（解析、读取、转换）
    #[error("{0}")]
    Build(#[from] BuildError),

    /// 组装错误
    #[error("{0}")]
    Assemble(#[from] AssembleError),

    /// 输出写入失败
    #[error("cannot write bundle to '{}': {source}", path.display())]
    Output { path: PathBuf, source: VfsError },

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),
}

impl WeldError {
    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            WeldError::Build(err) => match &err.kind {
                BuildErrorKind::Unresolved(_) => Phase::Resolve.as_str(),
                BuildErrorKind::Transform(_) => Phase::Transform.as_str(),
                BuildErrorKind::Read(_) => Phase::Graph.as_str(),
            },
            WeldError::Assemble(_) | WeldError::Output { .. } => Phase::Emit.as_str(),
            WeldError::Config(_) => "config",
        }
    }

    /// 获取错误行号（如果有）
    pub fn line(&self) -> Option<usize> {
        self.transform_error()
            .and_then(TransformError::position)
            .map(|(line, _)| line)
    }

    /// 获取错误列号（如果有）
    pub fn column(&self) -> Option<usize> {
        self.transform_error()
            .and_then(TransformError::position)
            .map(|(_, column)| column)
    }

    /// 底层的转换错误（如果有）
    pub fn transform_error(&self) -> Option<&TransformError> {
        match self {
            WeldError::Build(BuildError {
                kind: BuildErrorKind::Transform(err),
                ..
            }) => Some(err),
            _ => None,
        }
    }

    /// 错误类型（可用于程序化处理）
    pub fn error_kind(&self) -> &'static str {
        match self {
            WeldError::Build(err) => match &err.kind {
                BuildErrorKind::Unresolved(ResolveError::UnsupportedSpecifier { .. }) => "UnsupportedSpecifier",
                BuildErrorKind::Unresolved(_) => "UnresolvedModuleError",
                BuildErrorKind::Transform(_) => "TransformError",
                BuildErrorKind::Read(source) if source.is_not_found() => "NotFoundError",
                BuildErrorKind::Read(_) => "ReadError",
            },
            WeldError::Assemble(AssembleError::OpenGraph { .. }) => "OpenGraph",
            WeldError::Assemble(AssembleError::MissingEntry { .. }) => "MissingEntry",
            WeldError::Assemble(AssembleError::Encode(_)) => "EncodeError",
            WeldError::Output { .. } => "OutputError",
            WeldError::Config(_) => "ConfigError",
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，`--log-format json` 时序列化为 JSON。
    pub fn to_report(&self) -> ErrorReport {
        let (module, specifier) = match self {
            WeldError::Build(err) => (
                err.module.as_ref().map(ToString::to_string),
                err.specifier.clone(),
            ),
            WeldError::Assemble(AssembleError::OpenGraph {
                module, specifier, ..
            }) => (Some(module.to_string()), Some(specifier.clone())),
            _ => (None, None),
        };

        ErrorReport {
            phase: self.phase(),
            line: self.line(),
            column: self.column(),
            error_kind: self.error_kind().to_string(),
            message: self.to_string(),
            module,
            specifier,
        }
    }
}

/// 结构化错误报告
///
/// 上层应用（CLI、编辑器插件）可以根据自己的需求格式化。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// 错误阶段: resolve, transform, graph, emit, config
    pub phase: &'static str,
    /// 错误行号（1-based，如果有）
    pub line: Option<usize>,
    /// 错误列号（1-based，如果有）
    pub column: Option<usize>,
    /// 错误类型
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
    /// 出错的模块标识符
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// 相关的原始 specifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
}

impl fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.module, self.line, self.column) {
            (Some(module), Some(line), Some(col)) => write!(
                f,
                "[{}:{}:{}] {} error: {}",
                module, line, col, self.phase, self.message
            ),
            _ => write!(f, "[{}] {}: {}", self.phase, self.error_kind, self.message),
        }
    }
}
