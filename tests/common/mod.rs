//! 测试辅助工具
//!
//! 在临时目录中创建项目、打包，并在 `node` 可用时执行输出

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use weld_workspace::weld_vfs::NativeFileSystem;
use weld_workspace::{bundle, bundle_with, BundleConfig, BundleOutput, Transformer, WeldError};

/// 临时目录中的项目
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// 创建项目，路径相对项目根
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (path, source) in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(full, source).unwrap();
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self, entry: &str) -> BundleConfig {
        BundleConfig::new(self.root(), entry)
    }

    /// 使用默认配置打包，写入 `dist/bundle.js`
    pub fn bundle(&self, entry: &str) -> Result<BundleOutput, WeldError> {
        bundle(&self.config(entry), &NativeFileSystem::new())
    }

    /// 使用自定义转换器打包
    pub fn bundle_with(&self, entry: &str, transformer: &dyn Transformer) -> Result<BundleOutput, WeldError> {
        bundle_with(&self.config(entry), &NativeFileSystem::new(), transformer)
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.root().join("dist").join("bundle.js")
    }
}

/// `node` 是否可用
pub fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// 用 `node` 执行文件，返回 (是否成功, stdout, stderr)
///
/// `node` 不可用时返回 `None`，调用方应跳过运行时断言。
pub fn run_node(script: &Path) -> Option<(bool, String, String)> {
    if !node_available() {
        eprintln!("node not found on PATH; skipping runtime assertions");
        return None;
    }
    let output = Command::new("node").arg(script).output().ok()?;
    Some((
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    ))
}
