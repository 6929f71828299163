//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和源码上下文打印。

use std::path::Path;

use weld_api::{BuildError, BuildErrorKind, ResolveError, WeldError};
use weld_vfs::VirtualFileSystem;

/// 打印错误；转换错误附带出错模块的源码上下文
///
/// `json` 为真时打印结构化的错误报告。
pub fn print_error(e: &WeldError, fs: &dyn VirtualFileSystem, root: &Path, json: bool) {
    if json {
        match serde_json::to_string(&e.to_report()) {
            Ok(report) => eprintln!("{}", report),
            Err(_) => eprintln!("error: {}", e),
        }
        return;
    }

    eprintln!("error: {}", e);

    if let (Some(line), Some(column), WeldError::Build(BuildError { module: Some(module), .. })) =
        (e.line(), e.column(), e)
    {
        if let Ok(source) = fs.read_to_string(&root.join(module.relative_path())) {
            print_source_context(&source, line, column);
        }
    }

    if let Some(hint) = hint(e) {
        eprintln!("hint: {}", hint);
    }
}

fn hint(e: &WeldError) -> Option<&'static str> {
    match e {
        WeldError::Build(err) => match &err.kind {
            BuildErrorKind::Unresolved(ResolveError::UnsupportedSpecifier { .. }) => {
                Some("only relative imports ('./', '../') inside the project can be bundled")
            }
            BuildErrorKind::Unresolved(ResolveError::EscapesRoot { .. }) => {
                Some("imports must stay inside the directory that holds package.json")
            }
            BuildErrorKind::Unresolved(ResolveError::NotFound { .. }) => {
                Some("check the import path; extensionless imports are tried with the configured \"extensions\"")
            }
            _ => None,
        },
        WeldError::Output { .. } => Some("check that \"outDir\" is a writable directory"),
        _ => None,
    }
}

/// 打印源代码上下文（显示错误行前后几行）
pub fn print_source_context(source: &str, error_line: usize, error_col: usize) {
    const CONTEXT_LINES: usize = 2; // 错误行前后显示的上下文行数

    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();

    if error_line == 0 || error_line > total_lines {
        return;
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);

    // 行号的最大宽度，用于对齐
    let width = end_line.to_string().len();

    eprintln!("{}|--", "-".repeat(width + 1));
    for line_idx in start_line..=end_line {
        eprintln!("{:>width$} | {}", line_idx, lines[line_idx - 1], width = width);

        if line_idx == error_line {
            // 指向错误位置的标记
            let marker = " ".repeat(error_col.saturating_sub(1));
            eprintln!("{} | {}^", " ".repeat(width), marker);
        }
    }
    eprintln!("{}|--", "-".repeat(width + 1));
}
