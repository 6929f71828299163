//! Weld CLI - Command line interface
//!
//! Project-based bundling - configuration from package.json, overridable by flags

use clap::Parser;
use std::path::PathBuf;
use std::process;

mod config;
mod logging;
mod platform;
mod project;

use crate::config::LogConfig;
use crate::logging::{LogFormat, CLI_TARGET};
use crate::platform::print_error;
use crate::project::{build_config, read_package_json, Overrides};
use weld_api::{bundle_global, get_config, init_config, LogLevel};
use weld_vfs::NativeFileSystem;

#[derive(Parser)]
#[command(
    name = "weld",
    about = "Weld - bundle relative ES module imports into a single script",
    version
)]
struct Cli {
    /// Project file path (default: ./package.json)
    #[arg(value_name = "CONFIG", default_value = "package.json")]
    config: PathBuf,

    /// Entry module, relative to the project directory
    #[arg(long, value_name = "PATH")]
    entry: Option<String>,

    /// Output directory, relative to the project directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Output file name ([name] and [timestamp] are expanded)
    #[arg(long, value_name = "NAME")]
    filename: Option<String>,

    /// Print the bundle to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Print the dependency graph as JSON
    #[arg(long)]
    dump_graph: bool,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Per-phase log level, e.g. --log-phase graph=debug (repeatable)
    #[arg(long, value_name = "PHASE=LEVEL")]
    log_phase: Vec<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let fs = NativeFileSystem::new();

    // Read package.json
    let package = match read_package_json(&fs, &cli.config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("hint: {}", hint);
            }
            process::exit(1);
        }
    };

    let overrides = Overrides {
        entry: cli.entry.clone(),
        out_dir: cli.out_dir.clone(),
        filename: cli.filename.clone(),
        log_level: cli.log_level,
        stdout: cli.stdout,
    };
    let bundle_config = match build_config(&cli.config, &package, &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    // Logging
    let mut log_config = LogConfig::new(bundle_config.log_level);
    for spec in &cli.log_phase {
        if let Err(e) = log_config.apply_override(spec) {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
    if let Err(e) = logging::init_with_file(&log_config, cli.log_format, cli.log_file.as_deref()) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    // Initialize API config (global singleton for convenience)
    let root = bundle_config.root.clone();
    if init_config(bundle_config).is_err() {
        eprintln!("error: configuration was already initialized");
        process::exit(1);
    }
    tracing::debug!(target: CLI_TARGET, config = ?get_config(), "configuration loaded");

    let output = match bundle_global(&fs) {
        Ok(output) => output,
        Err(e) => {
            print_error(&e, &fs, &root, cli.log_format == LogFormat::Json);
            process::exit(1);
        }
    };

    if cli.dump_graph {
        match serde_json::to_string_pretty(&output.graph) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize dependency graph: {}", e);
                process::exit(1);
            }
        }
    }

    match &output.path {
        Some(path) => tracing::info!(
            target: CLI_TARGET,
            path = %path.display(),
            modules = output.module_count(),
            "wrote bundle"
        ),
        None => print!("{}", output.code),
    }
}
