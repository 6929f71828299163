//! API 层配置
//!
//! 全局单例（供 CLI 使用）；库调用方应直接把 `BundleConfig` 传给 [`crate::bundle`]。

use once_cell::sync::OnceCell;
use weld_config::BundleConfig;

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<BundleConfig> = OnceCell::new();

/// Initialize global configuration
///
/// Returns the rejected config if one was already installed.
pub fn init(config: BundleConfig) -> Result<(), BundleConfig> {
    GLOBAL_CONFIG.set(config)
}

/// Get global config reference (`None` before [`init`])
pub fn config() -> Option<&'static BundleConfig> {
    GLOBAL_CONFIG.get()
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_init_and_get() {
        // 全局状态只能设置一次，其他测试不得调用 init
        let cfg = BundleConfig::new("/proj", "main.js");
        assert!(init(cfg.clone()).is_ok());
        assert!(is_initialized());
        assert_eq!(config(), Some(&cfg));

        let rejected = init(BundleConfig::new("/other", "x.js")).unwrap_err();
        assert_eq!(rejected.root, std::path::PathBuf::from("/other"));
        assert_eq!(config().map(|c| c.root.clone()), Some("/proj".into()));
    }
}
