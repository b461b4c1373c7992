//! Daccy 主题图谱库
//!
//! 提供主题树校验、整洁树布局、进入/更新/退出协调与过渡动画，
//! 以及供 Slint 界面绘制的场景构建

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::config::{DiagramConfig, InitialExpansion, TransitionSpeed};
pub use model::diagram::{ClickOutcome, DiagramError, NodeClick, TopicDiagram};
pub use model::layout::{compute_layout, Point, TreeLayout};
pub use model::reconcile::{reconcile, Patch, RenderedScene};
pub use model::topic_tree::{NodeId, TopicTree};
