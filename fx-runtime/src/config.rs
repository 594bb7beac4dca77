//! # Config 模块
//!
//! 场景配置：视口尺寸、随机种子，以及按声明顺序挂载的效果列表。
//!
//! ```json
//! {
//!   "viewport": { "width": 1280, "height": 800 },
//!   "seed": 42,
//!   "effects": [
//!     { "name": "hero-title", "type": "split_text", "text": "Hi there",
//!       "mode": "words", "rect": { "x": 0, "y": 120, "width": 800, "height": 80 } },
//!     { "type": "particles" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::effects::EffectSpec;
use crate::error::{ConfigError, FxResult};
use crate::geometry::Rect;
use crate::stage::{EffectId, Stage, Viewport};

/// 视口配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f32,
    #[serde(default = "default_viewport_height")]
    pub height: f32,
}

fn default_viewport_width() -> f32 {
    1280.0
}

fn default_viewport_height() -> f32 {
    800.0
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl From<ViewportConfig> for Viewport {
    fn from(config: ViewportConfig) -> Self {
        Viewport::new(config.width, config.height)
    }
}

/// 场景中的一个效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    /// 名称（用于日志和错误信息）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 目标区域（页面坐标）；缺省表示元素不存在
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    #[serde(flatten)]
    pub effect: EffectSpec,
}

impl SceneEntry {
    pub fn new(effect: EffectSpec, rect: Option<Rect>) -> Self {
        Self {
            name: None,
            rect,
            effect,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 显示名：优先使用 `name`，否则为 `#序号 类型`
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{} {}", index, self.effect.kind()),
        }
    }
}

/// 场景配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// 随机种子；缺省时每次运行取系统熵
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub effects: Vec<SceneEntry>,
}

impl SceneConfig {
    /// 从 JSON 文本解析并验证
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let scene: Self = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// 从文件加载并验证
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let scene = Self::from_json_str(&content)?;
        info!(path = %path.display(), effects = scene.effects.len(), "场景加载成功");
        Ok(scene)
    }

    /// 保存到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ViewportConfig { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidViewport { width, height });
        }

        for (index, entry) in self.effects.iter().enumerate() {
            entry.effect.validate(&entry.label(index))?;
        }
        Ok(())
    }

    /// 按配置创建舞台（尚未挂载任何效果）
    pub fn create_stage(&self) -> Stage {
        match self.seed {
            Some(seed) => Stage::with_seed(self.viewport.into(), seed),
            None => Stage::new(self.viewport.into()),
        }
    }

    /// 验证配置、创建舞台并挂载全部效果
    pub fn instantiate(&self) -> FxResult<(Stage, Vec<EffectId>)> {
        self.validate()?;
        let mut stage = self.create_stage();
        let ids = stage.mount_scene(self);
        Ok((stage, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{CounterConfig, SplitMode};

    const SCENE: &str = r#"{
        "viewport": { "width": 1024, "height": 768 },
        "seed": 9,
        "effects": [
            { "name": "title", "type": "split_text", "text": "Hi there", "mode": "words",
              "rect": { "x": 0, "y": 100, "width": 600, "height": 60 } },
            { "type": "counter", "end": 95, "duration": 1.5 },
            { "type": "particles" }
        ]
    }"#;

    #[test]
    fn test_parse_scene() {
        let scene = SceneConfig::from_json_str(SCENE).unwrap();
        assert_eq!(scene.viewport.width, 1024.0);
        assert_eq!(scene.seed, Some(9));
        assert_eq!(scene.effects.len(), 3);

        let title = &scene.effects[0];
        assert_eq!(title.label(0), "title");
        assert_eq!(title.rect, Some(Rect::new(0.0, 100.0, 600.0, 60.0)));
        let EffectSpec::SplitText(config) = &title.effect else {
            panic!("expected split_text, got {:?}", title.effect);
        };
        assert_eq!(config.mode, SplitMode::Words);

        assert_eq!(scene.effects[1].label(1), "#1 counter");
        assert_eq!(scene.effects[1].rect, None);
    }

    #[test]
    fn test_validation_reports_entry_label() {
        let json = r#"{ "effects": [ { "type": "reveal", "duration": -0.5 } ] }"#;
        let err = SceneConfig::from_json_str(json).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref effect, .. } if effect == "#0 reveal"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_invalid_viewport() {
        let json = r#"{ "viewport": { "width": 0 } }"#;
        assert!(matches!(
            SceneConfig::from_json_str(json),
            Err(ConfigError::InvalidViewport { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");

        let scene = SceneConfig {
            seed: Some(1),
            effects: vec![
                SceneEntry::new(
                    EffectSpec::Counter(CounterConfig::new(0.0, 12.0)),
                    Some(Rect::new(0.0, 0.0, 50.0, 20.0)),
                )
                .with_name("projects"),
            ],
            ..SceneConfig::default()
        };
        scene.save(&path).unwrap();

        let loaded = SceneConfig::load(&path).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_missing_file() {
        let err = SceneConfig::load("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_instantiate() {
        let scene = SceneConfig::from_json_str(SCENE).unwrap();
        let (stage, ids) = scene.instantiate().unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stage.mounted_count(), 3);

        let broken = SceneConfig {
            viewport: ViewportConfig {
                width: -1.0,
                height: 600.0,
            },
            ..scene
        };
        assert!(matches!(
            broken.instantiate(),
            Err(crate::error::FxError::Config(ConfigError::InvalidViewport { .. }))
        ));
    }
}
