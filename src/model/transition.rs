//! 过渡动画：把协调结果变成随时间插值的帧
//!
//! 每个节点/连线键只保留一条轨道。新的补丁到达时，受影响的键从当前显示的
//! 位置和透明度重新出发，旧的目标直接作废（后写者胜）。

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::model::layout::Point;
use crate::model::reconcile::{Buckets, EdgeGeometry, Motion, Patch};
use crate::model::topic_tree::{EdgeKey, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Updating,
    Exiting,
}

/// 可插值的几何
pub trait Tween: Copy {
    fn tween(self, to: Self, t: f32) -> Self;
}

impl Tween for Point {
    fn tween(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

impl Tween for EdgeGeometry {
    fn tween(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

/// 三次缓入缓出
pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Track<G> {
    from: G,
    to: G,
    from_opacity: f32,
    to_opacity: f32,
    phase: Phase,
    started: Instant,
    duration: Duration,
}

impl<G: Tween> Track<G> {
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    fn sample(&self, now: Instant) -> (G, f32) {
        let t = ease_cubic_in_out(self.progress(now));
        let opacity = self.from_opacity + (self.to_opacity - self.from_opacity) * t;
        (self.from.tween(self.to, t), opacity)
    }

    fn finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameNode {
    pub id: NodeId,
    pub position: Point,
    pub opacity: f32,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEdge {
    pub key: EdgeKey,
    pub geometry: EdgeGeometry,
    pub phase: Phase,
}

/// 某一时刻应绘制的内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<FrameEdge>,
}

impl Frame {
    pub fn node(&self, id: NodeId) -> Option<&FrameNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Default)]
pub struct Animator {
    nodes: BTreeMap<NodeId, Track<Point>>,
    edges: BTreeMap<EdgeKey, Track<EdgeGeometry>>,
}

fn retarget<K: Ord + Copy, G: Tween>(
    tracks: &mut BTreeMap<K, Track<G>>,
    buckets: &Buckets<K, G>,
    now: Instant,
    duration: Duration,
) {
    let groups: [(&[Motion<K, G>], Phase, f32, f32); 3] = [
        (buckets.enter.as_slice(), Phase::Entering, 0.0, 1.0),
        (buckets.update.as_slice(), Phase::Updating, 1.0, 1.0),
        (buckets.exit.as_slice(), Phase::Exiting, 1.0, 0.0),
    ];
    for (motions, phase, start_opacity, to_opacity) in groups {
        for motion in motions {
            // 动画进行中则从当前显示状态出发
            let (from, from_opacity) = match tracks.get(&motion.key) {
                Some(track) => track.sample(now),
                None => (motion.from, start_opacity),
            };
            tracks.insert(
                motion.key,
                Track {
                    from,
                    to: motion.to,
                    from_opacity,
                    to_opacity,
                    phase,
                    started: now,
                    duration,
                },
            );
        }
    }
}

impl Animator {
    /// 应用一次补丁；之前的在途目标被覆盖
    pub fn apply(&mut self, patch: &Patch, now: Instant, duration: Duration) {
        self.prune(now);
        retarget(&mut self.nodes, &patch.nodes, now, duration);
        retarget(&mut self.edges, &patch.edges, now, duration);
    }

    /// 移除已完成的退出轨道
    pub fn prune(&mut self, now: Instant) {
        self.nodes
            .retain(|_, t| !(t.phase == Phase::Exiting && t.finished(now)));
        self.edges
            .retain(|_, t| !(t.phase == Phase::Exiting && t.finished(now)));
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// 所有轨道都已到达终点
    pub fn is_settled(&self, now: Instant) -> bool {
        self.nodes.values().all(|t| t.finished(now)) && self.edges.values().all(|t| t.finished(now))
    }

    pub fn sample(&self, now: Instant) -> Frame {
        let nodes = self
            .nodes
            .iter()
            .filter(|(_, t)| !(t.phase == Phase::Exiting && t.finished(now)))
            .map(|(&id, t)| {
                let (position, opacity) = t.sample(now);
                FrameNode {
                    id,
                    position,
                    opacity,
                    phase: t.phase,
                }
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|(_, t)| !(t.phase == Phase::Exiting && t.finished(now)))
            .map(|(&key, t)| FrameEdge {
                key,
                geometry: t.sample(now).0,
                phase: t.phase,
            })
            .collect();
        Frame { nodes, edges }
    }
}
