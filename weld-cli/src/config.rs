//! CLI 配置
//!
//! 日志配置：全局级别 + 按阶段覆盖

use tracing::Level;
use weld_config::{LogLevel, Phase};

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub resolve: Option<Level>,
    pub transform: Option<Level>,
    pub graph: Option<Level>,
    pub emit: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl LogConfig {
    pub fn new(global: LogLevel) -> Self {
        Self {
            global: to_tracing_level(global),
            resolve: None,
            transform: None,
            graph: None,
            emit: None,
        }
    }

    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        let level = match phase {
            Phase::Resolve => self.resolve,
            Phase::Transform => self.transform,
            Phase::Graph => self.graph,
            Phase::Emit => self.emit,
        };
        level.unwrap_or(self.global)
    }

    /// Apply a `<phase>=<level>` override, e.g. `graph=trace`
    pub fn apply_override(&mut self, spec: &str) -> Result<(), String> {
        let (phase, level) = spec
            .split_once('=')
            .ok_or_else(|| format!("invalid phase override '{}' (expected <phase>=<level>)", spec))?;
        let phase = Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == phase.trim())
            .ok_or_else(|| format!("unknown phase '{}' (expected resolve, transform, graph or emit)", phase))?;
        let level = to_tracing_level(level.trim().parse::<LogLevel>().map_err(|e| e.to_string())?);

        let slot = match phase {
            Phase::Resolve => &mut self.resolve,
            Phase::Transform => &mut self.transform,
            Phase::Graph => &mut self.graph,
            Phase::Emit => &mut self.emit,
        };
        *slot = Some(level);
        Ok(())
    }
}

fn to_tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_falls_back_to_global() {
        let config = LogConfig::new(LogLevel::Warn);
        for phase in Phase::ALL {
            assert_eq!(config.level_for(phase), Level::WARN);
        }
    }

    #[test]
    fn test_phase_override() {
        let mut config = LogConfig::default();
        config.apply_override("graph=trace").unwrap();
        config.apply_override("resolve = debug").unwrap();

        assert_eq!(config.level_for(Phase::Graph), Level::TRACE);
        assert_eq!(config.level_for(Phase::Resolve), Level::DEBUG);
        assert_eq!(config.level_for(Phase::Emit), Level::INFO);
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = LogConfig::default();
        assert!(config.apply_override("graph").is_err());
        assert!(config.apply_override("lexer=debug").unwrap_err().contains("unknown phase"));
        assert!(config.apply_override("emit=loud").unwrap_err().contains("unknown log level"));
    }
}
