//! Weld Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Weld crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Top-level configuration for one bundling run
#[derive(Debug, Clone, PartialEq)]
pub struct BundleConfig {
    /// Entry module path, relative to `root` (or absolute inside it)
    pub entry: PathBuf,
    /// Project root; every module identifier is relative to it
    pub root: PathBuf,
    /// Module resolution behavior
    pub resolve: ResolveConfig,
    /// Emitted artifact behavior
    pub output: OutputConfig,
    /// Global log level
    pub log_level: LogLevel,
}

impl BundleConfig {
    /// Create a configuration for `entry` inside `root` with default settings
    pub fn new(root: impl Into<PathBuf>, entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            root: root.into(),
            resolve: ResolveConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Configuration for the module resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveConfig {
    /// Extensions probed when a specifier does not name a file exactly
    pub extensions: Vec<String>,
    /// Whether `dir/index<ext>` is probed for directory specifiers
    pub resolve_index: bool,
    /// When false, identifiers are lowercased so differently-cased
    /// specifiers collapse onto one module
    pub case_sensitive: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string(), ".mjs".to_string()],
            resolve_index: true,
            case_sensitive: true,
        }
    }
}

/// Configuration for the emitted bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputConfig {
    /// Output directory, relative to the project root
    pub out_dir: PathBuf,
    /// Output file name; supports `[name]` and `[timestamp]` placeholders
    pub filename: String,
    /// Optional comment emitted at the top of the bundle
    pub banner: Option<String>,
    /// Emit `"use strict";` at the top of every module function
    pub strict: bool,
    /// Write the bundle to disk (false: only return the code)
    pub write: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("dist"),
            filename: "bundle.js".to_string(),
            banner: None,
            strict: true,
            write: true,
        }
    }
}

/// Log verbosity, independent of any logging backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Get the string name of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a log level string is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLogLevelError(pub String);

impl fmt::Display for ParseLogLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown log level '{}' (expected silent, error, warn, info, debug or trace)",
            self.0
        )
    }
}

impl std::error::Error for ParseLogLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            // silent = only errors
            "silent" | "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

/// Bundling phase enum for phase-specific log configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Resolve,
    Transform,
    Graph,
    Emit,
}

impl Phase {
    /// All phases, in pipeline order
    pub const ALL: [Phase; 4] = [Phase::Resolve, Phase::Transform, Phase::Graph, Phase::Emit];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Transform => "transform",
            Phase::Graph => "graph",
            Phase::Emit => "emit",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("weld::{}", self.as_str())
    }
}
