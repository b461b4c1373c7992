//! 内置数据集

use serde_json::Value;

use crate::model::diagram::DiagramError;

const ARRAY_METHODS: &str = include_str!("../../data/array_methods.json");
const DOCKER_COMMANDS: &str = include_str!("../../data/docker_commands.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinDataset {
    ArrayMethods,
    DockerCommands,
}

impl BuiltinDataset {
    pub const ALL: [BuiltinDataset; 2] = [BuiltinDataset::ArrayMethods, BuiltinDataset::DockerCommands];

    /// UI 按钮下标 → 数据集
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn title(self) -> &'static str {
        match self {
            BuiltinDataset::ArrayMethods => "Array Methods and Properties",
            BuiltinDataset::DockerCommands => "Docker Commands",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            BuiltinDataset::ArrayMethods => ARRAY_METHODS,
            BuiltinDataset::DockerCommands => DOCKER_COMMANDS,
        }
    }

    pub fn value(self) -> Result<Value, DiagramError> {
        Ok(serde_json::from_str(self.source())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::InitialExpansion;
    use crate::model::topic_tree::{IdAllocator, TopicTree};

    #[test]
    fn test_builtin_datasets_are_valid_trees() {
        for dataset in BuiltinDataset::ALL {
            let value = dataset.value().unwrap();
            let tree = TopicTree::from_value(&value, &mut IdAllocator::default(), InitialExpansion::All)
                .unwrap_or_else(|e| panic!("{} 校验失败: {e}", dataset.title()));
            assert!(tree.len() > 10);
        }
    }

    #[test]
    fn test_array_dataset_shape() {
        let value = BuiltinDataset::ArrayMethods.value().unwrap();
        let tree = TopicTree::from_value(&value, &mut IdAllocator::default(), InitialExpansion::All).unwrap();
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.name, "Array");
        assert_eq!(root.children().len(), 5);
        assert!(tree.find_by_name("Array.prototype.map()").is_some());
    }

    #[test]
    fn test_from_index() {
        assert_eq!(BuiltinDataset::from_index(0), Some(BuiltinDataset::ArrayMethods));
        assert_eq!(BuiltinDataset::from_index(1), Some(BuiltinDataset::DockerCommands));
        assert_eq!(BuiltinDataset::from_index(2), None);
        assert_eq!(BuiltinDataset::from_index(-1), None);
    }
}
