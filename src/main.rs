//! 程序入口：初始化日志、加载 Slint UI，并绑定主题图谱 VM

use std::{cell::Cell, cell::RefCell, path::Path, path::PathBuf, rc::Rc};
use std::time::{Duration, Instant};

use slint::{ComponentHandle, ModelRc, Timer, TimerMode, VecModel};
use tracing_subscriber::fmt::SubscriberBuilder;

use daccy_tree::model::config::{DiagramConfig, TransitionSpeed, CONFIG_FILE_NAME};
use daccy_tree::model::datasets::BuiltinDataset;
use daccy_tree::model::diagram::{DiagramError, NodeClick, TopicDiagram};
use daccy_tree::model::topic_info::{TopicCatalog, TopicInfo, CATALOG_FILE_NAME};
use daccy_tree::model::topic_tree::NodeId;
use daccy_tree::utils;
use daccy_tree::vm::bridge::*;
use daccy_tree::vm::scene::{build_scene, SceneEdge, SceneNode};

slint::include_modules!();

/// 0xRRGGBB 转 Slint 颜色
fn rgb(c: u32) -> slint::Color {
    slint::Color::from_rgb_u8((c >> 16) as u8, (c >> 8) as u8, c as u8)
}

impl TryFrom<&SceneNode> for SceneNodeData {
    type Error = NodeId;

    /// 节点ID超出 UI 的 int 范围时返回该ID
    fn try_from(node: &SceneNode) -> Result<Self, Self::Error> {
        let id = node.ui_id().ok_or(node.id)?;
        Ok(Self {
            id,
            label: node.label.clone().into(),
            x: node.x,
            y: node.y,
            opacity: node.opacity,
            fill: rgb(node.fill),
            label_on_left: node.label_on_left,
        })
    }
}

impl From<&SceneEdge> for SceneEdgeData {
    fn from(edge: &SceneEdge) -> Self {
        Self {
            commands: edge.commands.clone().into(),
            stroke: rgb(edge.color),
        }
    }
}

// 详情面板：主题名 + 目录说明
impl From<(&NodeClick, TopicInfo)> for TopicPanelData {
    fn from((click, info): (&NodeClick, TopicInfo)) -> Self {
        Self {
            visible: true,
            title: click.name.clone().into(),
            description: info.description.into(),
            syntax: info.syntax.unwrap_or_default().into(),
            example: info.example.unwrap_or_default().into(),
        }
    }
}

/// VM桥接器：管理UI与图谱数据层的交互
struct ViewModelBridge {
    diagram: Rc<RefCell<TopicDiagram>>,
    /// 详情面板当前展示的节点
    selected: Rc<Cell<Option<NodeId>>>,
    /// 过渡动画的帧驱动
    animation: Rc<Timer>,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(app_window: &AppWindow, diagram: Rc<RefCell<TopicDiagram>>, catalog: TopicCatalog) -> Self {
        let bridge = Self {
            diagram,
            selected: Rc::new(Cell::new(None)),
            animation: Rc::new(Timer::default()),
        };

        bridge.subscribe_detail_panel(app_window, catalog);
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 点击通知 → 详情面板
    fn subscribe_detail_panel(&self, app_window: &AppWindow, catalog: TopicCatalog) {
        let app_window_weak = app_window.as_weak();
        let selected = self.selected.clone();
        self.diagram.borrow_mut().subscribe(move |click| {
            let Some(app_window) = app_window_weak.upgrade() else {
                return;
            };
            let info = catalog.lookup(&click.name);
            if catalog.get(&click.name).is_none() {
                tracing::debug!("目录中没有主题说明: {}", click.name);
            }
            selected.set(Some(click.id));
            app_window.set_topic_panel(TopicPanelData::from((click, info)));
        });
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        let diagram = self.diagram.clone();

        // === 节点点击回调 ===
        {
            let diagram = diagram.clone();
            let animation = self.animation.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_node_clicked(move |id, slow| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_node_clicked(&app_window, &diagram, &animation, id, slow);
                }
            });
        }

        // === 内置数据集回调 ===
        {
            let diagram = diagram.clone();
            let animation = self.animation.clone();
            let selected = self.selected.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_builtin(move |index| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_load_builtin(&app_window, &diagram, &animation, &selected, index);
                }
            });
        }

        // === 打开数据集文件回调 ===
        {
            let diagram = diagram.clone();
            let animation = self.animation.clone();
            let selected = self.selected.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_open_dataset(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_open_dataset(&app_window, &diagram, &animation, &selected);
                }
            });
        }

        // === 复制子树回调 ===
        {
            let diagram = diagram.clone();
            let selected = self.selected.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_topic(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_copy_topic(&app_window, &diagram, &selected);
                }
            });
        }

        // === 关闭详情面板回调 ===
        {
            let selected = self.selected.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_close_topic(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::close_topic_panel(&app_window, &selected);
                }
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_status_message(STATUS_READY.into());
        app_window.set_dataset_title("".into());
        app_window.set_topic_panel(TopicPanelData::default());
        app_window.set_scene_nodes(ModelRc::new(VecModel::<SceneNodeData>::default()));
        app_window.set_scene_edges(ModelRc::new(VecModel::<SceneEdgeData>::default()));
    }

    /// 显示文件选择对话框
    fn show_file_dialog() -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter("JSON文件", &["json"])
            .add_filter("所有文件", &["*"])
            .set_title("选择主题数据集")
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    fn handle_node_clicked(
        app_window: &AppWindow,
        diagram: &Rc<RefCell<TopicDiagram>>,
        animation: &Rc<Timer>,
        id: i32,
        slow: bool,
    ) {
        let Ok(raw) = u64::try_from(id) else {
            tracing::warn!("收到非法节点ID: {}", id);
            return;
        };
        let speed = if slow {
            TransitionSpeed::Slow
        } else {
            TransitionSpeed::Normal
        };

        let outcome = diagram.borrow_mut().click(NodeId(raw), Instant::now(), speed);
        if outcome.is_some_and(|o| o.patch.is_some()) {
            Self::start_animation(app_window, diagram, animation);
        }
    }

    fn handle_load_builtin(
        app_window: &AppWindow,
        diagram: &Rc<RefCell<TopicDiagram>>,
        animation: &Rc<Timer>,
        selected: &Rc<Cell<Option<NodeId>>>,
        index: i32,
    ) {
        let Some(dataset) = BuiltinDataset::from_index(index) else {
            tracing::warn!("未知的内置数据集序号: {}", index);
            return;
        };
        let result = dataset
            .value()
            .and_then(|v| diagram.borrow_mut().load_value(v, Instant::now()));
        Self::finish_load(app_window, diagram, animation, selected, dataset.title(), result.map(|_| ()));
    }

    /// 处理打开数据集文件操作
    fn handle_open_dataset(
        app_window: &AppWindow,
        diagram: &Rc<RefCell<TopicDiagram>>,
        animation: &Rc<Timer>,
        selected: &Rc<Cell<Option<NodeId>>>,
    ) {
        let Some(path) = Self::show_file_dialog() else {
            app_window.set_status_message("未选择文件".into());
            return;
        };

        let result = diagram.borrow_mut().load_file(&path, Instant::now());
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::finish_load(app_window, diagram, animation, selected, &title, result.map(|_| ()));
    }

    /// 加载结束后的统一处理：成功则重置面板并播放挂载动画，失败则保留原图谱
    fn finish_load(
        app_window: &AppWindow,
        diagram: &Rc<RefCell<TopicDiagram>>,
        animation: &Rc<Timer>,
        selected: &Rc<Cell<Option<NodeId>>>,
        title: &str,
        result: Result<(), DiagramError>,
    ) {
        match result {
            Ok(()) => {
                Self::close_topic_panel(app_window, selected);
                app_window.set_dataset_title(title.into());
                app_window.set_status_message(STATUS_LOADED.into());
                Self::start_animation(app_window, diagram, animation);
            }
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                tracing::error!("数据集加载失败: {}", e);
            }
        }
    }

    /// 复制选中主题在源数据中的完整子树
    fn handle_copy_topic(
        app_window: &AppWindow,
        diagram: &Rc<RefCell<TopicDiagram>>,
        selected: &Rc<Cell<Option<NodeId>>>,
    ) {
        let Some(id) = selected.get() else {
            app_window.set_status_message(STATUS_NOTHING_SELECTED.into());
            return;
        };

        let copied = diagram
            .borrow()
            .extract_subtree_pretty(id)
            .and_then(|text| {
                utils::clipboard::copy_to_clipboard(&text)
                    .map(|()| text.len())
                    .map_err(|e| DiagramError::State(e.to_string()))
            });
        match copied {
            Ok(len) => {
                app_window.set_status_message(STATUS_COPIED.into());
                tracing::info!("子树已复制到剪贴板，长度: {} 字符", len);
            }
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                tracing::error!("复制失败: {}", e);
            }
        }
    }

    fn close_topic_panel(app_window: &AppWindow, selected: &Rc<Cell<Option<NodeId>>>) {
        selected.set(None);
        app_window.set_topic_panel(TopicPanelData::default());
    }

    /// 把当前帧写入UI模型
    fn render_frame(app_window: &AppWindow, diagram: &TopicDiagram, now: Instant) {
        let scene = build_scene(diagram, now);
        let nodes: Vec<SceneNodeData> = scene
            .nodes
            .iter()
            .filter_map(|n| match SceneNodeData::try_from(n) {
                Ok(data) => Some(data),
                Err(id) => {
                    tracing::warn!("节点ID {} 超出UI范围，跳过绘制", id);
                    None
                }
            })
            .collect();
        let edges: Vec<SceneEdgeData> = scene.edges.iter().map(SceneEdgeData::from).collect();

        app_window.set_canvas_width(scene.width);
        app_window.set_canvas_height(scene.height);
        app_window.set_scene_nodes(ModelRc::new(VecModel::from(nodes)));
        app_window.set_scene_edges(ModelRc::new(VecModel::from(edges)));
    }

    /// 绘制首帧，并在过渡未完成时启动帧定时器；全部轨道到达终点后定时器自行停止
    fn start_animation(app_window: &AppWindow, diagram: &Rc<RefCell<TopicDiagram>>, animation: &Rc<Timer>) {
        let now = Instant::now();
        Self::render_frame(app_window, &diagram.borrow(), now);
        if !diagram.borrow().is_animating(now) || animation.running() {
            return;
        }

        let diagram = diagram.clone();
        let app_window_weak = app_window.as_weak();
        let timer = Rc::downgrade(animation);
        animation.start(TimerMode::Repeated, Duration::from_millis(FRAME_INTERVAL_MS), move || {
            let now = Instant::now();
            let settled = match app_window_weak.upgrade() {
                Some(app_window) => {
                    let diagram = diagram.borrow();
                    Self::render_frame(&app_window, &diagram, now);
                    !diagram.is_animating(now)
                }
                None => true,
            };
            if settled {
                if let Some(timer) = timer.upgrade() {
                    timer.stop();
                }
            }
        });
    }
}

/// 读取配置；文件损坏时回退到默认配置
fn load_config() -> DiagramConfig {
    match DiagramConfig::load_or_default(Path::new(CONFIG_FILE_NAME)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("配置文件无效，使用默认配置: {}", e);
            DiagramConfig::default()
        }
    }
}

/// 内置主题目录，工作目录下的附加目录同名条目覆盖内置条目
fn load_catalog() -> anyhow::Result<TopicCatalog> {
    let mut catalog = TopicCatalog::builtin()?;
    let extra = Path::new(CATALOG_FILE_NAME);
    if extra.exists() {
        match TopicCatalog::load(extra) {
            Ok(more) => {
                tracing::info!("已合并附加主题目录: {} 条", more.len());
                catalog.merge(more);
            }
            Err(e) => tracing::warn!("附加主题目录加载失败: {}", e),
        }
    }
    Ok(catalog)
}

fn main() -> anyhow::Result<()> {
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let config = load_config();
    let catalog = load_catalog()?;
    let app = AppWindow::new()?;
    let diagram = Rc::new(RefCell::new(TopicDiagram::new(config)));

    let bridge = ViewModelBridge::new(&app, diagram, catalog);
    bridge.initialize_ui(&app);

    // 默认展示数组方法图谱
    ViewModelBridge::handle_load_builtin(
        &app,
        &bridge.diagram,
        &bridge.animation,
        &bridge.selected,
        0,
    );

    tracing::info!("应用启动成功，UI已初始化");
    app.run()?;
    Ok(())
}
