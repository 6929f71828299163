//! 模块标识与解析
//!
//! - [`ModuleId`]：规范化的模块路径（项目根相对，`./` 前缀，`/` 分隔）
//! - [`Resolver`]：把 import 里的原始 specifier 解析为 [`ModuleId`]

mod id;
mod resolver;

pub use id::ModuleId;
pub use resolver::{Resolved, ResolveError, Resolver};
