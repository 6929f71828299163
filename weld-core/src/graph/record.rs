//! 模块记录

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::module::ModuleId;

/// 单个模块在依赖图中的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    id: ModuleId,
    /// 原始 specifier → 目标标识符，按源码顺序
    dependencies: Vec<(String, ModuleId)>,
    /// 转换后的代码
    code: String,
}

impl ModuleRecord {
    pub fn new(id: ModuleId, code: String, dependencies: Vec<(String, ModuleId)>) -> Self {
        Self {
            id,
            dependencies,
            code,
        }
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn dependencies(&self) -> &[(String, ModuleId)] {
        &self.dependencies
    }

    /// 按原始 specifier 查找目标模块
    pub fn dependency(&self, specifier: &str) -> Option<&ModuleId> {
        self.dependencies
            .iter()
            .find(|(raw, _)| raw == specifier)
            .map(|(_, target)| target)
    }

    /// 以 specifier 为键的对象形式（用于序列化）
    pub fn dependency_map(&self) -> DependencyMap<'_> {
        DependencyMap(&self.dependencies)
    }
}

/// 按 JSON 对象序列化依赖表，保持源码顺序
#[derive(Debug, Clone, Copy)]
pub struct DependencyMap<'a>(&'a [(String, ModuleId)]);

impl Serialize for DependencyMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(raw, target)| (raw, target)))
    }
}

impl Serialize for ModuleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModuleRecord", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("dependencies", &self.dependency_map())?;
        state.serialize_field("code", &self.code)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_lookup() {
        let util = ModuleId::new("src/util.js", true).unwrap();
        let record = ModuleRecord::new(
            ModuleId::new("src/index.js", true).unwrap(),
            String::new(),
            vec![("./util".to_string(), util.clone()), ("./util.js".to_string(), util.clone())],
        );

        assert_eq!(record.dependency("./util"), Some(&util));
        assert_eq!(record.dependency("./util.js"), Some(&util));
        assert_eq!(record.dependency("./other.js"), None);
    }

    #[test]
    fn test_dependency_map_preserves_order() {
        let record = ModuleRecord::new(
            ModuleId::new("a.js", true).unwrap(),
            String::new(),
            vec![
                ("./z.js".to_string(), ModuleId::new("z.js", true).unwrap()),
                ("./b.js".to_string(), ModuleId::new("b.js", true).unwrap()),
            ],
        );

        let json = serde_json::to_string(&record.dependency_map()).unwrap();
        assert_eq!(json, r#"{"./z.js":"./z.js","./b.js":"./b.js"}"#);
    }
}
