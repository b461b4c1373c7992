//! 场景构建：把动画帧转换成可直接绘制的标记、标签和连线路径

use std::time::Instant;

use crate::model::diagram::TopicDiagram;
use crate::model::layout::{Bounds, Point};
use crate::model::reconcile::EdgeGeometry;
use crate::model::topic_tree::{EdgeKey, NodeId};

pub const MARGIN_TOP: f32 = 20.0;
pub const MARGIN_RIGHT: f32 = 120.0;
pub const MARGIN_BOTTOM: f32 = 20.0;
pub const MARGIN_LEFT: f32 = 120.0;

/// 连线配色（10色分类调色板）
pub const LINK_COLORS: [u32; 10] = [
    0x1f77b4, 0xff7f0e, 0x2ca02c, 0xd62728, 0x9467bd, 0x8c564b, 0xe377c2, 0x7f7f7f, 0xbcbd22, 0x17becf,
];
/// 有子节点的标记颜色
pub const BRANCH_FILL: u32 = 0x555555;
/// 叶子标记颜色
pub const LEAF_FILL: u32 = 0x999999;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub label: String,
    /// 画布坐标（已加边距偏移）
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    /// 0xRRGGBB
    pub fill: u32,
    /// 有子节点时标签在标记左侧
    pub label_on_left: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEdge {
    pub key: EdgeKey,
    /// SVG 路径命令
    pub commands: String,
    pub color: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
    pub width: f32,
    pub height: f32,
}

impl SceneNode {
    /// UI 侧使用 i32 作为节点ID，超出范围时返回 None
    pub fn ui_id(&self) -> Option<i32> {
        i32::try_from(self.id.0).ok()
    }
}

/// 连线颜色按目标节点ID取色：同一条连线在整个动画过程中颜色不变
pub fn edge_color(key: EdgeKey) -> u32 {
    LINK_COLORS[(key.target.0 % LINK_COLORS.len() as u64) as usize]
}

/// 横向三次贝塞尔连线：控制点位于两端的水平中点
pub fn link_path(edge: &EdgeGeometry, offset: Point) -> String {
    let s = Point::new(edge.source.x + offset.x, edge.source.y + offset.y);
    let t = Point::new(edge.target.x + offset.x, edge.target.y + offset.y);
    let mid = (s.x + t.x) / 2.0;
    format!(
        "M {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
        s.x, s.y, mid, s.y, mid, t.y, t.x, t.y
    )
}

/// 画布偏移：让布局包围盒落在边距之内
pub fn canvas_offset(bounds: Option<Bounds>) -> Point {
    match bounds {
        Some(b) => Point::new(MARGIN_LEFT - b.min.x, MARGIN_TOP - b.min.y),
        None => Point::new(MARGIN_LEFT, MARGIN_TOP),
    }
}

pub fn build_scene(diagram: &TopicDiagram, now: Instant) -> Scene {
    let bounds = diagram.bounds();
    let offset = canvas_offset(bounds);
    let frame = diagram.frame(now);

    // 先序倒序：父节点绘制在子节点之上
    let nodes = frame
        .nodes
        .iter()
        .rev()
        .filter_map(|n| {
            let node = diagram.node(n.id)?;
            let has_children = !node.is_leaf();
            Some(SceneNode {
                id: n.id,
                label: node.name.clone(),
                x: n.position.x + offset.x,
                y: n.position.y + offset.y,
                opacity: n.opacity,
                fill: if has_children { BRANCH_FILL } else { LEAF_FILL },
                label_on_left: has_children,
            })
        })
        .collect();

    let edges = frame
        .edges
        .iter()
        .map(|e| SceneEdge {
            key: e.key,
            commands: link_path(&e.geometry, offset),
            color: edge_color(e.key),
        })
        .collect();

    let (width, height) = match bounds {
        Some(b) => (
            b.width() + MARGIN_LEFT + MARGIN_RIGHT,
            b.height() + MARGIN_TOP + MARGIN_BOTTOM,
        ),
        None => (MARGIN_LEFT + MARGIN_RIGHT, MARGIN_TOP + MARGIN_BOTTOM),
    };

    Scene {
        nodes,
        edges,
        width,
        height,
    }
}
