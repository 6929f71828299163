//! 转换适配器
//!
//! 把单个模块的源码转换为可移植代码，并报告其中的 import specifier。
//! 图构建只依赖 [`Transformer`] trait；内置的 [`EsmTransformer`] 负责把
//! ES 模块语法改写为 `(require, exports)` 约定。

mod esm;
mod scanner;

pub use esm::EsmTransformer;

use crate::module::ModuleId;
use thiserror::Error;

/// 转换结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transformed {
    /// 可移植代码，执行时通过 `require(specifier)` 取依赖、向 `exports` 写导出
    pub code: String,
    /// 原始 import specifier，按源码顺序，保持书写原样，不含重复
    pub import_specifiers: Vec<String>,
}

/// 转换错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// 源码无法解析
    #[error("{message} at {line}:{column}")]
    Syntax {
        message: String,
        /// 行号，1-based
        line: usize,
        /// 列号，1-based
        column: usize,
    },

    /// 外部转换器报告的其他错误
    #[error("{0}")]
    Custom(String),
}

impl TransformError {
    /// 错误位置（行, 列）
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            TransformError::Syntax { line, column, .. } => Some((*line, *column)),
            TransformError::Custom(_) => None,
        }
    }
}

/// 转换器 trait
///
/// 对图构建而言是不透明的服务：输入源码，输出代码和 specifier 列表。
/// 实现必须原样保留 specifier 文本，无法解析时返回描述性错误。
pub trait Transformer {
    fn transform(&self, source: &str, path: &ModuleId) -> Result<Transformed, TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(&str, &ModuleId) -> Result<Transformed, TransformError>,
{
    fn transform(&self, source: &str, path: &ModuleId) -> Result<Transformed, TransformError> {
        self(source, path)
    }
}
