//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。
//! 日志写到 stderr，stdout 留给 `--stdout` / `--dump-graph` 的输出。

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{
    filter::Targets,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    Layer, Registry,
};
use weld_config::Phase;

use crate::config::LogConfig;

/// CLI 日志目标
pub const CLI_TARGET: &str = "weld::cli";
/// API 层日志目标
const API_TARGET: &str = "weld::api";

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 日志初始化错误
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file '{}': {source}", path.display())]
    File { path: PathBuf, source: io::Error },

    #[error("cannot install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// 构建按阶段过滤的 target 表
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::ALL
        .into_iter()
        .fold(Targets::new().with_default(log_config.global), |targets, phase| {
            targets.with_target(phase.target(), log_config.level_for(phase))
        })
        .with_target(API_TARGET, log_config.global)
        .with_target(CLI_TARGET, log_config.global)
}

/// 使用指定格式和日志配置初始化日志系统，可选同时写入日志文件
pub fn init_with_file(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<&Path>,
) -> Result<(), LoggingError> {
    let targets = targets(log_config);

    let mut layers = vec![create_format_layer(format, io::stderr, true)
        .with_filter(targets.clone())
        .boxed()];

    // If file specified, output to both console and file
    if let Some(path) = file {
        let file_handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggingError::File {
                path: path.to_path_buf(),
                source,
            })?;
        layers.push(
            create_format_layer(format, Mutex::new(file_handle), false)
                .with_filter(targets)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

/// Create formatter layer based on format
fn create_format_layer<M>(
    format: LogFormat,
    make_writer: M,
    ansi: bool,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    M: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_ansi(ansi)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(ansi)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
