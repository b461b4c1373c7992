//! 协调引擎：对比上一次渲染的节点/连线集合与新的可见集合，
//! 把每个元素归入进入 / 更新 / 退出三类，并给出动画起止几何。

use std::collections::BTreeMap;

use crate::model::layout::{Point, TreeLayout};
use crate::model::topic_tree::{EdgeKey, NodeId, TopicTree};

/// 连线两端坐标
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeGeometry {
    pub source: Point,
    pub target: Point,
}

impl EdgeGeometry {
    /// 两端重合于一点的连线（进入/退出动画的起点或终点）
    pub fn collapsed_at(p: Point) -> Self {
        Self { source: p, target: p }
    }

    pub fn lerp(self, to: EdgeGeometry, t: f32) -> EdgeGeometry {
        EdgeGeometry {
            source: self.source.lerp(to.source, t),
            target: self.target.lerp(to.target, t),
        }
    }
}

/// 一次布局对应的渲染集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedScene {
    pub nodes: BTreeMap<NodeId, Point>,
    pub edges: BTreeMap<EdgeKey, EdgeGeometry>,
}

impl RenderedScene {
    pub fn from_layout(tree: Option<&TopicTree>, layout: &TreeLayout) -> Self {
        let Some(tree) = tree else {
            return Self::default();
        };
        let edges = tree
            .visible_edges()
            .into_iter()
            .filter_map(|key| {
                let geometry = EdgeGeometry {
                    source: layout.get(key.source)?,
                    target: layout.get(key.target)?,
                };
                Some((key, geometry))
            })
            .collect();
        Self {
            nodes: layout.positions.clone(),
            edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// 动画的发起点：进入元素从 `enter_from` 出发，退出元素收拢到 `exit_to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub enter_from: Point,
    pub exit_to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion<K, G> {
    pub key: K,
    pub from: G,
    pub to: G,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Buckets<K, G> {
    pub enter: Vec<Motion<K, G>>,
    pub update: Vec<Motion<K, G>>,
    pub exit: Vec<Motion<K, G>>,
}

impl<K: Copy, G> Buckets<K, G> {
    pub fn enter_keys(&self) -> Vec<K> {
        self.enter.iter().map(|m| m.key).collect()
    }

    pub fn update_keys(&self) -> Vec<K> {
        self.update.iter().map(|m| m.key).collect()
    }

    pub fn exit_keys(&self) -> Vec<K> {
        self.exit.iter().map(|m| m.key).collect()
    }

    pub fn len(&self) -> usize {
        self.enter.len() + self.update.len() + self.exit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 一次重算产生的全部动画指令
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub nodes: Buckets<NodeId, Point>,
    pub edges: Buckets<EdgeKey, EdgeGeometry>,
}

fn classify<K: Ord + Copy, G: Copy>(
    old: &BTreeMap<K, G>,
    new: &BTreeMap<K, G>,
    enter_from: G,
    exit_to: G,
) -> Buckets<K, G> {
    let mut buckets = Buckets {
        enter: Vec::new(),
        update: Vec::new(),
        exit: Vec::new(),
    };
    for (&key, &to) in new {
        match old.get(&key) {
            Some(&from) => buckets.update.push(Motion { key, from, to }),
            None => buckets.enter.push(Motion { key, from: enter_from, to }),
        }
    }
    for (&key, &from) in old {
        if !new.contains_key(&key) {
            buckets.exit.push(Motion { key, from, to: exit_to });
        }
    }
    buckets
}

/// 对比两次渲染集合；三个分组恰好划分新旧键的并集
pub fn reconcile(previous: &RenderedScene, next: &RenderedScene, origin: Origin) -> Patch {
    let nodes = classify(&previous.nodes, &next.nodes, origin.enter_from, origin.exit_to);
    let edges = classify(
        &previous.edges,
        &next.edges,
        EdgeGeometry::collapsed_at(origin.enter_from),
        EdgeGeometry::collapsed_at(origin.exit_to),
    );
    Patch { nodes, edges }
}
