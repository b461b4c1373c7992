//! 布局引擎：为可见子树中的每个节点计算二维坐标
//!
//! 横向为深度轴（x = depth * level_spacing），纵向为广度轴。
//! 广度坐标采用轮廓合并的整洁树算法：子树按顺序自上而下摆放，
//! 每棵新子树在各层都与已摆放部分保持最小间距，父节点居中于首末子节点之间。
//! 子节点顺序不变，因此连线不会交叉。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::topic_tree::{NodeId, TopicTree};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, to: Point, t: f32) -> Point {
        Point {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub node_spacing: f32,
    pub level_spacing: f32,
    /// 不同父节点的同层节点间距倍数
    pub cousin_separation: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 20.0,
            level_spacing: 180.0,
            cousin_separation: 2.0,
        }
    }
}

/// 包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn of<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Bounds> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds { min: *p, max: *p },
                Some(b) => Bounds {
                    min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                    max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
                },
            })
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    pub positions: BTreeMap<NodeId, Point>,
}

impl TreeLayout {
    pub fn get(&self, id: NodeId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(self.positions.values())
    }
}

/// 已摆放子树：节点相对子树根的广度偏移，以及每层的 (最小, 最大) 轮廓
struct Subtree {
    offsets: Vec<(NodeId, f32)>,
    contour: Vec<(f32, f32)>,
}

fn place(tree: &TopicTree, id: NodeId, cfg: &LayoutConfig) -> Subtree {
    let kids = tree.get(id).map(|n| n.visible_children()).unwrap_or(&[]);
    if kids.is_empty() {
        return Subtree {
            offsets: vec![(id, 0.0)],
            contour: vec![(0.0, 0.0)],
        };
    }

    let mut placed: Vec<(Subtree, f32)> = Vec::with_capacity(kids.len());
    // 已摆放子树合并后的轮廓，第0层为子节点这一层
    let mut merged: Vec<(f32, f32)> = Vec::new();

    for &child in kids {
        let sub = place(tree, child, cfg);
        let shift = if merged.is_empty() {
            0.0
        } else {
            merged
                .iter()
                .zip(&sub.contour)
                .enumerate()
                .map(|(level, (&(_, above), &(below, _)))| {
                    let gap = if level == 0 {
                        cfg.node_spacing
                    } else {
                        cfg.node_spacing * cfg.cousin_separation
                    };
                    above + gap - below
                })
                .fold(f32::NEG_INFINITY, f32::max)
        };

        for (level, &(lo, hi)) in sub.contour.iter().enumerate() {
            match merged.get_mut(level) {
                Some(slot) => slot.1 = hi + shift,
                None => merged.push((lo + shift, hi + shift)),
            }
        }
        placed.push((sub, shift));
    }

    let first = placed.first().map(|(_, s)| *s).unwrap_or(0.0);
    let last = placed.last().map(|(_, s)| *s).unwrap_or(0.0);
    let center = (first + last) / 2.0;

    let mut offsets = vec![(id, 0.0)];
    for (sub, shift) in placed {
        offsets.extend(sub.offsets.into_iter().map(|(nid, off)| (nid, off + shift - center)));
    }
    let mut contour = vec![(0.0, 0.0)];
    contour.extend(merged.into_iter().map(|(lo, hi)| (lo - center, hi - center)));

    Subtree { offsets, contour }
}

/// 计算可见子树的布局；没有数据时返回空布局
pub fn compute_layout(tree: Option<&TopicTree>, cfg: &LayoutConfig) -> TreeLayout {
    let Some(tree) = tree else {
        return TreeLayout::default();
    };

    let root = tree.root();
    let placed = place(tree, root, cfg);
    let positions = placed
        .offsets
        .into_iter()
        .filter_map(|(id, breadth)| {
            let depth = tree.get(id)?.depth;
            Some((id, Point::new(depth as f32 * cfg.level_spacing, breadth)))
        })
        .collect();

    TreeLayout { positions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::InitialExpansion;
    use crate::model::topic_tree::IdAllocator;
    use serde_json::json;

    fn tree_of(v: serde_json::Value) -> TopicTree {
        TopicTree::from_value(&v, &mut IdAllocator::default(), InitialExpansion::All).unwrap()
    }

    fn pos(tree: &TopicTree, layout: &TreeLayout, name: &str) -> Point {
        layout.get(tree.find_by_name(name).unwrap().id).unwrap()
    }

    #[test]
    fn test_empty_input_gives_empty_layout() {
        let layout = compute_layout(None, &LayoutConfig::default());
        assert!(layout.is_empty());
        assert!(layout.bounds().is_none());
    }

    #[test]
    fn test_single_chain_is_straight() {
        let tree = tree_of(json!({
            "name": "Array",
            "children": [{ "name": "Static methods", "children": [{ "name": "Array.from()" }] }]
        }));
        let layout = compute_layout(Some(&tree), &LayoutConfig::default());

        assert_eq!(layout.len(), 3);
        assert_eq!(pos(&tree, &layout, "Array"), Point::new(0.0, 0.0));
        assert_eq!(pos(&tree, &layout, "Static methods"), Point::new(180.0, 0.0));
        assert_eq!(pos(&tree, &layout, "Array.from()"), Point::new(360.0, 0.0));
    }

    #[test]
    fn test_parent_centered_and_siblings_spaced() {
        let tree = tree_of(json!({
            "name": "r",
            "children": [{ "name": "a" }, { "name": "b" }, { "name": "c" }]
        }));
        let layout = compute_layout(Some(&tree), &LayoutConfig::default());

        assert_eq!(pos(&tree, &layout, "a").y, -20.0);
        assert_eq!(pos(&tree, &layout, "b").y, 0.0);
        assert_eq!(pos(&tree, &layout, "c").y, 20.0);
        assert_eq!(pos(&tree, &layout, "r").y, 0.0);
    }

    #[test]
    fn test_cousins_get_wider_gap() {
        let tree = tree_of(json!({
            "name": "r",
            "children": [
                { "name": "a", "children": [{ "name": "a1" }, { "name": "a2" }] },
                { "name": "b", "children": [{ "name": "b1" }] }
            ]
        }));
        let layout = compute_layout(Some(&tree), &LayoutConfig::default());

        let a2 = pos(&tree, &layout, "a2").y;
        let b1 = pos(&tree, &layout, "b1").y;
        assert!(b1 - a2 >= 40.0 - f32::EPSILON, "a2={a2} b1={b1}");
        assert!(pos(&tree, &layout, "b").y - pos(&tree, &layout, "a").y >= 20.0);
    }

    #[test]
    fn test_no_overlap_per_level_and_order_kept() {
        let tree = tree_of(json!({
            "name": "r",
            "children": [
                { "name": "a", "children": [{ "name": "a1", "children": [{ "name": "a11" }, { "name": "a12" }] }] },
                { "name": "b" },
                { "name": "c", "children": [{ "name": "c1" }, { "name": "c2" }, { "name": "c3" }] }
            ]
        }));
        let layout = compute_layout(Some(&tree), &LayoutConfig::default());

        // 每层按先序排列的节点广度坐标严格递增且间距不小于 node_spacing
        let mut by_depth: BTreeMap<u32, Vec<f32>> = BTreeMap::new();
        for id in tree.visible_ids() {
            let depth = tree.get(id).unwrap().depth;
            by_depth.entry(depth).or_default().push(layout.get(id).unwrap().y);
        }
        for ys in by_depth.values() {
            for pair in ys.windows(2) {
                assert!(pair[1] - pair[0] >= 20.0 - 1e-3, "{ys:?}");
            }
        }
    }

    #[test]
    fn test_collapsed_subtree_not_positioned() {
        let mut tree = tree_of(json!({
            "name": "r",
            "children": [{ "name": "a", "children": [{ "name": "a1" }] }]
        }));
        let a = tree.find_by_name("a").unwrap().id;
        let a1 = tree.find_by_name("a1").unwrap().id;
        tree.toggle(a);

        let layout = compute_layout(Some(&tree), &LayoutConfig::default());
        assert_eq!(layout.len(), 2);
        assert!(layout.get(a1).is_none());
    }

    #[test]
    fn test_layout_is_deterministic() {
        let tree = tree_of(crate::model::datasets::BuiltinDataset::ArrayMethods.value().unwrap());
        let cfg = LayoutConfig::default();
        let first = compute_layout(Some(&tree), &cfg);
        let second = compute_layout(Some(&tree), &cfg);
        assert_eq!(first, second);
        assert_eq!(first.len(), tree.len());
    }

    #[test]
    fn test_custom_spacing() {
        let tree = tree_of(json!({ "name": "r", "children": [{ "name": "a" }, { "name": "b" }] }));
        let cfg = LayoutConfig {
            node_spacing: 50.0,
            level_spacing: 100.0,
            ..LayoutConfig::default()
        };
        let layout = compute_layout(Some(&tree), &cfg);
        assert_eq!(pos(&tree, &layout, "a"), Point::new(100.0, -25.0));
        assert_eq!(pos(&tree, &layout, "b"), Point::new(100.0, 25.0));

        let bounds = layout.bounds().unwrap();
        assert_eq!(bounds.width(), 100.0);
        assert_eq!(bounds.height(), 50.0);
    }
}
