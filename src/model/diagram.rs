//! TopicDiagram：图谱核心状态，串联数据校验、布局、协调与过渡动画

use std::path::Path;
use std::time::{Duration, Instant};

use jsonpath_rust::{JsonPath, query::queryable::Queryable}; // 提供 query 扩展
use serde_json::Value;
use thiserror::Error;

use crate::model::config::{DiagramConfig, TransitionSpeed};
use crate::model::layout::{compute_layout, Bounds, Point, TreeLayout};
use crate::model::reconcile::{reconcile, Origin, Patch, RenderedScene};
use crate::model::topic_tree::{EdgeKey, IdAllocator, NodeId, Toggle, TopicNode, TopicTree, ValidationIssue};
use crate::model::transition::{Animator, Frame};
use crate::utils::fs::read_json_file;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("数据校验失败 {path}: {issue}")]
    Validation { path: String, issue: ValidationIssue },
    #[error("配置错误: {0}")]
    Config(String),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
}

/// 点击通知：交给详情面板等外部协作者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeClick {
    pub id: NodeId,
    pub name: String,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickOutcome {
    pub event: NodeClick,
    pub toggle: Toggle,
    /// 叶子节点点击不产生补丁
    pub patch: Option<Patch>,
}

type ClickListener = Box<dyn FnMut(&NodeClick)>;

pub struct TopicDiagram {
    config: DiagramConfig,
    ids: IdAllocator,
    tree: Option<TopicTree>,
    /// 原始数据，用于按节点路径提取子树
    source: Option<Value>,
    layout: TreeLayout,
    /// 上一次重算的目标状态（动画起点的权威来源）
    scene: RenderedScene,
    animator: Animator,
    listeners: Vec<ClickListener>,
}

impl Default for TopicDiagram {
    fn default() -> Self {
        Self::new(DiagramConfig::default())
    }
}

impl TopicDiagram {
    pub fn new(config: DiagramConfig) -> Self {
        Self {
            config,
            ids: IdAllocator::default(),
            tree: None,
            source: None,
            layout: TreeLayout::default(),
            scene: RenderedScene::default(),
            animator: Animator::default(),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn tree(&self) -> Option<&TopicTree> {
        self.tree.as_ref()
    }

    pub fn node(&self, id: NodeId) -> Option<&TopicNode> {
        self.tree.as_ref()?.get(id)
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.layout.bounds()
    }

    /// 订阅点击通知
    pub fn subscribe(&mut self, listener: impl FnMut(&NodeClick) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// 加载数据集并挂载（全部元素进入）。校验失败时保留原有图谱不变
    pub fn load_value(&mut self, value: Value, now: Instant) -> Result<Patch, DiagramError> {
        let start = Instant::now();
        let tree = TopicTree::from_value(&value, &mut self.ids, self.config.initial_expansion)?;
        let root = tree.root();
        let node_count = tree.len();

        self.tree = Some(tree);
        self.source = Some(value);
        self.scene = RenderedScene::default();
        self.animator.clear();

        let patch = self.recompute(root, now, self.config.duration(TransitionSpeed::Normal));
        tracing::info!(
            "数据集加载成功: {} 个节点，可见 {} 个，耗时: {}ms",
            node_count,
            self.layout.len(),
            start.elapsed().as_millis()
        );
        Ok(patch)
    }

    pub fn load_str(&mut self, text: &str, now: Instant) -> Result<Patch, DiagramError> {
        let value: Value = serde_json::from_str(text)?;
        self.load_value(value, now)
    }

    pub fn load_file(&mut self, p: &Path, now: Instant) -> Result<Patch, DiagramError> {
        let value = read_json_file(p)?;
        self.load_value(value, now)
    }

    /// 处理节点点击：切换展开状态、重算布局并通知订阅者。
    /// 未知或过期的ID直接忽略
    pub fn click(&mut self, id: NodeId, now: Instant, speed: TransitionSpeed) -> Option<ClickOutcome> {
        let (event, toggle) = {
            let Some(tree) = self.tree.as_mut() else {
                tracing::debug!("尚未加载数据，忽略点击 {}", id);
                return None;
            };
            let Some(node) = tree.get(id) else {
                tracing::debug!("节点 {} 不在当前图谱中，忽略点击", id);
                return None;
            };
            let event = NodeClick {
                id,
                name: node.name.clone(),
                depth: node.depth,
            };
            (event, tree.toggle(id)?)
        };

        let patch = match toggle {
            Toggle::Leaf => None,
            Toggle::Expanded | Toggle::Collapsed => {
                Some(self.recompute(id, now, self.config.duration(speed)))
            }
        };
        tracing::info!("节点{:?}: {} ({})", toggle, event.name, id);

        for listener in &mut self.listeners {
            listener(&event);
        }

        Some(ClickOutcome { event, toggle, patch })
    }

    /// 根据当前展开标记重新布局，并与上一次目标状态协调
    fn recompute(&mut self, source: NodeId, now: Instant, duration: Duration) -> Patch {
        let layout = compute_layout(self.tree.as_ref(), &self.config.layout());
        let next = RenderedScene::from_layout(self.tree.as_ref(), &layout);

        let enter_from = self
            .scene
            .nodes
            .get(&source)
            .or_else(|| next.nodes.get(&source))
            .copied()
            .unwrap_or_default();
        let exit_to = next.nodes.get(&source).copied().unwrap_or(enter_from);

        let patch = reconcile(&self.scene, &next, Origin { enter_from, exit_to });
        self.animator.apply(&patch, now, duration);

        self.layout = layout;
        self.scene = next;
        patch
    }

    /// 当前可见节点（先序）
    pub fn visible_ids(&self) -> Vec<NodeId> {
        self.tree.as_ref().map(|t| t.visible_ids()).unwrap_or_default()
    }

    pub fn visible_edges(&self) -> Vec<EdgeKey> {
        self.tree.as_ref().map(|t| t.visible_edges()).unwrap_or_default()
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.layout.get(id)
    }

    /// 采样某一时刻应绘制的帧
    pub fn frame(&self, now: Instant) -> Frame {
        self.animator.sample(now)
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        !self.animator.is_settled(now)
    }

    /// 按节点路径提取源数据子树的 pretty 字符串
    pub fn extract_subtree_pretty(&self, id: NodeId) -> Result<String, DiagramError> {
        let dom = self
            .source
            .as_ref()
            .ok_or_else(|| DiagramError::State("数据集尚未加载".into()))?;
        let node = self
            .node(id)
            .ok_or_else(|| DiagramError::State(format!("节点 {} 不在当前图谱中", id)))?;
        let hits: Vec<&Value> = dom
            .query(&node.path)
            .map_err(|e| DiagramError::JsonPath(e.to_string()))?;
        let first = hits
            .into_iter()
            .next()
            .ok_or_else(|| DiagramError::JsonPath(format!("未匹配到任何节点: {}", node.path)))?;
        Ok(serde_json::to_string_pretty(first)?)
    }
}
