//! VM桥接层：连接Slint UI与TopicDiagram数据模型
//!
//! 注意：回调绑定在main.rs中实现，因为依赖于Slint生成的类型
//! 这里只提供公共常量

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_LOADED: &str = "数据集加载完成";
pub const STATUS_COPIED: &str = "已复制到剪贴板";
pub const STATUS_NOTHING_SELECTED: &str = "错误: 尚未选中任何主题";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

/// 动画帧间隔（约60帧每秒）
pub const FRAME_INTERVAL_MS: u64 = 16;
