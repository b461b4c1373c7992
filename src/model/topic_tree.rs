//! 主题树：校验输入数据集，分配稳定ID，维护每个节点的展开/折叠状态
//!
//! 拓扑结构在构建后不再变化，只有 `expanded` 标记会随点击切换；
//! 可见子节点是由 `expanded` 推导出来的视图，不另存副本。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::config::InitialExpansion;
use crate::model::diagram::DiagramError;

/// 节点稳定标识：会话内只分配一次，重新加载数据集也不会复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 会话级ID分配器
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// 连线标识：(父节点, 子节点)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
}

/// 数据集校验失败的具体原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("节点必须是JSON对象")]
    NotAnObject,
    #[error("缺少 name 字段")]
    MissingName,
    #[error("name 必须是字符串")]
    NameNotString,
    #[error("children 必须是数组")]
    ChildrenNotArray,
}

/// 一次点击切换的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Expanded,
    Collapsed,
    /// 叶子节点没有子节点，切换无效果
    Leaf,
}

#[derive(Debug, Clone)]
pub struct TopicNode {
    pub id: NodeId,
    /// 显示标签
    pub name: String,
    /// 节点在源数据中的 JSONPath（用于提取子树）
    pub path: String,
    /// 节点深度（根为0）
    pub depth: u32,
    pub parent: Option<NodeId>,
    /// 是否展开
    pub expanded: bool,
    children: Vec<NodeId>,
}

impl TopicNode {
    /// 全部子节点（构建后不变）
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// 当前可见的子节点：展开时等于全部子节点，折叠时为空
    pub fn visible_children(&self) -> &[NodeId] {
        if self.expanded {
            &self.children
        } else {
            &[]
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// 建立 ID → 槽位索引。ID 重复说明分配器被绕过，开发构建下直接报错
fn index_nodes(nodes: &[TopicNode]) -> HashMap<NodeId, usize> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (slot, node) in nodes.iter().enumerate() {
        let previous = index.insert(node.id, slot);
        debug_assert!(previous.is_none(), "节点ID重复: {}", node.id);
    }
    index
}

#[derive(Debug, Clone)]
pub struct TopicTree {
    root: NodeId,
    /// 先序排列
    nodes: Vec<TopicNode>,
    index: HashMap<NodeId, usize>,
}

impl TopicTree {
    /// 从JSON值构建主题树，任何格式问题都会在布局之前报错
    pub fn from_value(
        root: &Value,
        ids: &mut IdAllocator,
        expansion: InitialExpansion,
    ) -> Result<Self, DiagramError> {
        fn invalid(path: &str, issue: ValidationIssue) -> DiagramError {
            DiagramError::Validation {
                path: path.to_string(),
                issue,
            }
        }

        fn walk(
            out: &mut Vec<TopicNode>,
            v: &Value,
            path: &str,
            parent: Option<NodeId>,
            depth: u32,
            ids: &mut IdAllocator,
            expansion: InitialExpansion,
        ) -> Result<NodeId, DiagramError> {
            let obj = v
                .as_object()
                .ok_or_else(|| invalid(path, ValidationIssue::NotAnObject))?;
            let name = match obj.get("name") {
                None => return Err(invalid(path, ValidationIssue::MissingName)),
                Some(Value::String(s)) => s.clone(),
                Some(_) => return Err(invalid(&format!("{}.name", path), ValidationIssue::NameNotString)),
            };
            let kids: &[Value] = match obj.get("children") {
                None | Some(Value::Null) => &[],
                Some(Value::Array(a)) => a.as_slice(),
                Some(_) => {
                    return Err(invalid(
                        &format!("{}.children", path),
                        ValidationIssue::ChildrenNotArray,
                    ))
                }
            };

            let id = ids.next_id();
            let expanded = match expansion {
                InitialExpansion::All => true,
                InitialExpansion::RootOnly => parent.is_none(),
            };
            let slot = out.len();
            out.push(TopicNode {
                id,
                name,
                path: path.to_string(),
                depth,
                parent,
                expanded,
                children: Vec::with_capacity(kids.len()),
            });

            for (idx, child) in kids.iter().enumerate() {
                let child_path = format!("{}.children[{}]", path, idx);
                let child_id = walk(out, child, &child_path, Some(id), depth + 1, ids, expansion)?;
                out[slot].children.push(child_id);
            }
            Ok(id)
        }

        let mut nodes = Vec::with_capacity(64);
        let root_id = walk(&mut nodes, root, "$", None, 0, ids, expansion)?;
        let index = index_nodes(&nodes);

        Ok(Self {
            root: root_id,
            nodes,
            index,
        })
    }

    /// 从JSON文本构建
    pub fn from_json_str(
        text: &str,
        ids: &mut IdAllocator,
        expansion: InitialExpansion,
    ) -> Result<Self, DiagramError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value, ids, expansion)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&TopicNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 先序遍历全部节点（含被折叠隐藏的）
    pub fn nodes(&self) -> impl Iterator<Item = &TopicNode> {
        self.nodes.iter()
    }

    /// 按名称查找第一个匹配节点（先序）
    pub fn find_by_name(&self, name: &str) -> Option<&TopicNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// 切换节点展开状态；未知ID返回 None
    pub fn toggle(&mut self, id: NodeId) -> Option<Toggle> {
        let &slot = self.index.get(&id)?;
        let node = &mut self.nodes[slot];
        if node.is_leaf() {
            return Some(Toggle::Leaf);
        }
        node.expanded = !node.expanded;
        Some(if node.expanded {
            Toggle::Expanded
        } else {
            Toggle::Collapsed
        })
    }

    /// 可见集合：从根出发只沿可见子节点可达的节点（先序）
    pub fn visible_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.get(id) {
                stack.extend(node.visible_children().iter().rev());
            }
        }
        out
    }

    /// 可见连线
    pub fn visible_edges(&self) -> Vec<EdgeKey> {
        self.visible_ids()
            .into_iter()
            .filter_map(|id| self.get(id))
            .flat_map(|node| {
                node.visible_children().iter().map(move |&target| EdgeKey {
                    source: node.id,
                    target,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(v: &Value) -> TopicTree {
        TopicTree::from_value(v, &mut IdAllocator::default(), InitialExpansion::All).unwrap()
    }

    fn names(tree: &TopicTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| tree.get(id).unwrap().name.clone()).collect()
    }

    #[test]
    fn test_build_assigns_preorder_ids_and_paths() {
        let data = json!({
            "name": "Array",
            "children": [
                { "name": "Constructor", "children": [{ "name": "Array()" }] },
                { "name": "Static methods", "children": [{ "name": "Array.from()" }] }
            ]
        });
        let tree = build(&data);

        assert_eq!(tree.len(), 5);
        let all: Vec<_> = tree.nodes().map(|n| (n.id.0, n.name.as_str(), n.depth)).collect();
        assert_eq!(
            all,
            vec![
                (0, "Array", 0),
                (1, "Constructor", 1),
                (2, "Array()", 2),
                (3, "Static methods", 1),
                (4, "Array.from()", 2),
            ]
        );
        assert_eq!(tree.get(NodeId(4)).unwrap().path, "$.children[1].children[0]");
        assert_eq!(tree.get(NodeId(4)).unwrap().parent, Some(NodeId(3)));
    }

    #[test]
    fn test_ids_continue_across_loads() {
        let mut ids = IdAllocator::default();
        let a = TopicTree::from_value(&json!({"name": "a"}), &mut ids, InitialExpansion::All).unwrap();
        let b = TopicTree::from_value(&json!({"name": "b"}), &mut ids, InitialExpansion::All).unwrap();
        assert_ne!(a.root(), b.root());
        assert!(!b.contains(a.root()));
    }

    #[test]
    fn test_validation_errors_carry_path() {
        let cases = [
            (json!([1, 2]), "$", ValidationIssue::NotAnObject),
            (json!({"children": []}), "$", ValidationIssue::MissingName),
            (json!({"name": 3}), "$.name", ValidationIssue::NameNotString),
            (json!({"name": "x", "children": {}}), "$.children", ValidationIssue::ChildrenNotArray),
            (
                json!({"name": "x", "children": [{"name": "y"}, "z"]}),
                "$.children[1]",
                ValidationIssue::NotAnObject,
            ),
        ];
        for (input, want_path, want_issue) in cases {
            let err = TopicTree::from_value(&input, &mut IdAllocator::default(), InitialExpansion::All)
                .unwrap_err();
            match err {
                DiagramError::Validation { path, issue } => {
                    assert_eq!(path, want_path);
                    assert_eq!(issue, want_issue);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_null_children_is_leaf() {
        let tree = build(&json!({"name": "a", "children": null}));
        assert!(tree.get(tree.root()).unwrap().is_leaf());
    }

    #[test]
    fn test_parse_error_from_text() {
        let err = TopicTree::from_json_str("{ not json", &mut IdAllocator::default(), InitialExpansion::All)
            .unwrap_err();
        assert!(matches!(err, DiagramError::Parse(_)));
    }

    #[test]
    fn test_root_only_expansion() {
        let data = json!({
            "name": "r",
            "children": [{ "name": "a", "children": [{ "name": "a1" }] }, { "name": "b" }]
        });
        let tree = TopicTree::from_value(&data, &mut IdAllocator::default(), InitialExpansion::RootOnly)
            .unwrap();
        assert_eq!(names(&tree, &tree.visible_ids()), vec!["r", "a", "b"]);
        assert_eq!(tree.visible_edges().len(), 2);
    }

    #[test]
    fn test_collapse_keeps_descendant_state() {
        let data = json!({
            "name": "root",
            "children": [{
                "name": "A",
                "children": [{ "name": "B", "children": [{ "name": "C" }] }]
            }]
        });
        let mut tree = build(&data);
        let a = tree.find_by_name("A").unwrap().id;
        let b = tree.find_by_name("B").unwrap().id;

        assert_eq!(tree.toggle(a), Some(Toggle::Collapsed));
        assert_eq!(names(&tree, &tree.visible_ids()), vec!["root", "A"]);
        assert!(tree.get(b).unwrap().expanded);

        assert_eq!(tree.toggle(a), Some(Toggle::Expanded));
        assert_eq!(names(&tree, &tree.visible_ids()), vec!["root", "A", "B", "C"]);

        // B 折叠后再折叠/展开 A，B 依然保持折叠
        tree.toggle(b);
        tree.toggle(a);
        tree.toggle(a);
        assert_eq!(names(&tree, &tree.visible_ids()), vec!["root", "A", "B"]);
    }

    #[test]
    fn test_leaf_and_unknown_toggle() {
        let mut tree = build(&json!({"name": "r", "children": [{"name": "leaf"}]}));
        let leaf = tree.find_by_name("leaf").unwrap().id;
        let before = tree.visible_ids();
        assert_eq!(tree.toggle(leaf), Some(Toggle::Leaf));
        assert_eq!(tree.visible_ids(), before);
        assert_eq!(tree.toggle(NodeId(999)), None);
    }

    fn bare_node(id: u64) -> TopicNode {
        TopicNode {
            id: NodeId(id),
            name: format!("n{}", id),
            path: "$".into(),
            depth: 0,
            parent: None,
            expanded: true,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_index_nodes_maps_slots() {
        let index = index_nodes(&[bare_node(3), bare_node(7)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index[&NodeId(7)], 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "节点ID重复")]
    fn test_duplicate_id_fails_loudly() {
        index_nodes(&[bare_node(7), bare_node(7)]);
    }
}
