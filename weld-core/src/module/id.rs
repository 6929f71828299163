//! 模块标识符

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// 模块标识符
///
/// 项目根目录下的规范化相对路径，例如 `./src/util.js`：
/// - 统一使用 `/` 作为分隔符
/// - 不含 `.` / `..` 段
/// - 始终以 `./` 开头
///
/// 指向同一文件的不同 specifier 必须得到字符串相等的标识符，
/// 图构建的去重完全依赖这一点。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// 从项目根相对路径构造标识符
    ///
    /// 路径越出项目根目录（或规范化后为空）时返回 `None`。
    ///
    /// # Examples
    /// ```
    /// use weld_core::ModuleId;
    ///
    /// let id = ModuleId::new("src/lib/../util.js", true).unwrap();
    /// assert_eq!(id.as_str(), "./src/util.js");
    /// assert!(ModuleId::new("../outside.js", true).is_none());
    /// ```
    pub fn new(path: &str, case_sensitive: bool) -> Option<Self> {
        clean_relative(path).map(|clean| Self::from_clean(clean, case_sensitive))
    }

    /// 从已规范化的相对路径构造（不带 `./` 前缀）
    pub(crate) fn from_clean(clean: String, case_sensitive: bool) -> Self {
        let clean = if case_sensitive {
            clean
        } else {
            clean.to_lowercase()
        };
        Self(format!("./{}", clean))
    }

    /// 完整标识符文本
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 去掉 `./` 前缀后的相对路径
    pub fn relative_path(&self) -> &str {
        self.0.strip_prefix("./").unwrap_or(&self.0)
    }

    /// 所在目录（相对路径，根目录为空串）
    pub fn dir(&self) -> &str {
        let relative = self.relative_path();
        match relative.rfind('/') {
            Some(idx) => &relative[..idx],
            None => "",
        }
    }

    /// 文件名
    pub fn file_name(&self) -> &str {
        let relative = self.relative_path();
        match relative.rfind('/') {
            Some(idx) => &relative[idx + 1..],
            None => relative,
        }
    }

    /// 去掉扩展名的文件名
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// 词法规范化一个项目根相对路径（保留大小写）
///
/// 越出根目录、绝对路径或规范化后为空时返回 `None`。
pub(crate) fn clean_relative(path: &str) -> Option<String> {
    let unified = path.replace('\\', "/");
    if unified.starts_with('/') {
        return None;
    }
    let cleaned = path_clean::clean(&unified);
    if cleaned.is_absolute() {
        return None;
    }
    let text = cleaned.to_string_lossy().replace('\\', "/");
    if text.is_empty() || text == "." || text == ".." || text.starts_with("../") {
        return None;
    }
    Some(text)
}

/// 把 specifier 拼接到目录上（目录为空表示项目根）
pub(crate) fn join_relative(dir: &str, specifier: &str) -> String {
    if dir.is_empty() {
        specifier.to_string()
    } else {
        format!("{}/{}", dir, specifier)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_dot_segments() {
        let id = ModuleId::new("./src/./lib/../util.js", true).unwrap();
        assert_eq!(id.as_str(), "./src/util.js");
    }

    #[test]
    fn test_distinct_spellings_collapse() {
        let a = ModuleId::new("src/util.js", true).unwrap();
        let b = ModuleId::new("src/nested/../util.js", true).unwrap();
        let c = ModuleId::new("src\\util.js", true).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_escaping_root_rejected() {
        assert!(ModuleId::new("../a.js", true).is_none());
        assert!(ModuleId::new("src/../../a.js", true).is_none());
        assert!(ModuleId::new("/abs/a.js", true).is_none());
        assert!(ModuleId::new(".", true).is_none());
    }

    #[test]
    fn test_case_insensitive_lowercases() {
        let id = ModuleId::new("Src/Util.JS", false).unwrap();
        assert_eq!(id.as_str(), "./src/util.js");
        let kept = ModuleId::new("Src/Util.JS", true).unwrap();
        assert_eq!(kept.as_str(), "./Src/Util.JS");
    }

    #[test]
    fn test_path_parts() {
        let id = ModuleId::new("src/lib/util.min.js", true).unwrap();
        assert_eq!(id.relative_path(), "src/lib/util.min.js");
        assert_eq!(id.dir(), "src/lib");
        assert_eq!(id.file_name(), "util.min.js");
        assert_eq!(id.stem(), "util.min");

        let root = ModuleId::new("index.js", true).unwrap();
        assert_eq!(root.dir(), "");
        assert_eq!(root.stem(), "index");
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("", "./a.js"), "./a.js");
        assert_eq!(join_relative("src", "../a.js"), "src/../a.js");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ModuleId::new("src/index.js", true).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""./src/index.js""#);
    }
}
