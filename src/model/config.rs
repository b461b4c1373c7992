//! 图谱配置：间距、初始展开方式、过渡时长

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::diagram::DiagramError;
use crate::model::layout::LayoutConfig;
use crate::utils::fs::read_json_file;

/// 默认配置文件名（位于工作目录）
pub const CONFIG_FILE_NAME: &str = "daccy.config.json";

/// 首次加载时的展开方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialExpansion {
    /// 全部展开（默认）
    #[default]
    All,
    /// 只展开根节点
    RootOnly,
}

/// 过渡速度：慢速模式下时长放大，便于观察动画
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionSpeed {
    #[default]
    Normal,
    Slow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramConfig {
    /// 广度方向（兄弟节点之间）的最小间距
    pub node_spacing: f32,
    /// 深度方向每层的间距
    pub level_spacing: f32,
    pub initial_expansion: InitialExpansion,
    pub transition_ms: u64,
    pub slow_transition_ms: u64,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            node_spacing: 20.0,
            level_spacing: 180.0,
            initial_expansion: InitialExpansion::All,
            transition_ms: 250,
            slow_transition_ms: 2500,
        }
    }
}

impl DiagramConfig {
    /// 从JSON文件读取配置，缺省字段使用默认值
    pub fn load(p: &Path) -> Result<Self, DiagramError> {
        let value = read_json_file(p)?;
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// 配置文件存在则读取，否则使用默认配置
    pub fn load_or_default(p: &Path) -> Result<Self, DiagramError> {
        if p.exists() {
            Self::load(p)
        } else {
            tracing::info!("未找到配置文件 {}，使用默认配置", p.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), DiagramError> {
        for (field, value) in [
            ("nodeSpacing", self.node_spacing),
            ("levelSpacing", self.level_spacing),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DiagramError::Config(format!(
                    "{} 必须是正数，当前为 {}",
                    field, value
                )));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            node_spacing: self.node_spacing,
            level_spacing: self.level_spacing,
            ..LayoutConfig::default()
        }
    }

    pub fn duration(&self, speed: TransitionSpeed) -> Duration {
        match speed {
            TransitionSpeed::Normal => Duration::from_millis(self.transition_ms),
            TransitionSpeed::Slow => Duration::from_millis(self.slow_transition_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DiagramConfig =
            serde_json::from_str(r#"{ "levelSpacing": 240, "initialExpansion": "root-only" }"#).unwrap();
        assert_eq!(config.level_spacing, 240.0);
        assert_eq!(config.node_spacing, 20.0);
        assert_eq!(config.initial_expansion, InitialExpansion::RootOnly);
        assert_eq!(config.transition_ms, 250);
    }

    #[test]
    fn test_default_expansion_is_all() {
        assert_eq!(DiagramConfig::default().initial_expansion, InitialExpansion::All);
    }

    #[test]
    fn test_invalid_spacing_rejected() {
        let config = DiagramConfig {
            node_spacing: 0.0,
            ..DiagramConfig::default()
        };
        assert!(matches!(config.validate(), Err(DiagramError::Config(_))));

        let config = DiagramConfig {
            level_spacing: f32::NAN,
            ..DiagramConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "nodeSpacing": 32, "slowTransitionMs": 1000 }}"#).unwrap();

        let config = DiagramConfig::load(file.path()).unwrap();
        assert_eq!(config.node_spacing, 32.0);
        assert_eq!(config.duration(TransitionSpeed::Slow), Duration::from_millis(1000));
        assert_eq!(config.duration(TransitionSpeed::Normal), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiagramConfig::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, DiagramConfig::default());
    }

    #[test]
    fn test_unknown_expansion_rejected() {
        let err = serde_json::from_str::<DiagramConfig>(r#"{ "initialExpansion": "some" }"#);
        assert!(err.is_err());
    }
}
