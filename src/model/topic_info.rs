//! 主题说明目录：点击节点后详情面板展示的描述、语法和示例

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::diagram::DiagramError;
use crate::utils::fs::read_json_file;

const BUILTIN_CATALOG: &str = include_str!("../../data/topic_info.json");

/// 工作目录下的附加目录文件
pub const CATALOG_FILE_NAME: &str = "daccy.topics.json";

/// 目录中没有该主题时的描述
pub const TOPIC_INFO_MISSING: &str = "Information not available for this topic.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl TopicInfo {
    pub fn missing() -> Self {
        Self {
            description: TOPIC_INFO_MISSING.to_string(),
            syntax: None,
            example: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicCatalog {
    entries: HashMap<String, TopicInfo>,
}

impl TopicCatalog {
    /// 随程序发布的内置目录
    pub fn builtin() -> Result<Self, DiagramError> {
        Ok(serde_json::from_str(BUILTIN_CATALOG)?)
    }

    pub fn load(p: &Path) -> Result<Self, DiagramError> {
        Ok(serde_json::from_value(read_json_file(p)?)?)
    }

    /// 合并另一个目录，同名主题以后者为准
    pub fn merge(&mut self, other: TopicCatalog) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, name: &str) -> Option<&TopicInfo> {
        self.entries.get(name)
    }

    /// 查找主题说明，未收录时返回占位描述
    pub fn lookup(&self, name: &str) -> TopicInfo {
        self.get(name).cloned().unwrap_or_else(TopicInfo::missing)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
