//! # SplitText 效果
//!
//! 将文本拆分为字符或单词，进入视口时按阅读顺序依次入场。
//!
//! 拆分结果在挂载时一次性确定；单元 `i` 的动画在触发后 `i × stagger` 秒开始。

use serde::{Deserialize, Serialize};

use super::Effect;
use crate::animation::{EasingFunction, Style, StyleTween};
use crate::geometry::Vec2;
use crate::render::{Patch, UnitFrame};
use crate::stage::{EffectContext, Signal};
use crate::trigger::VisibilityOptions;

/// 不换行空格
const NBSP: char = '\u{00A0}';

/// 拆分粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    #[default]
    Chars,
    Words,
}

/// 拆分后的最小动画单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// 原始文本
    pub text: String,
    /// 是否为空格单元
    pub is_space: bool,
}

impl TextUnit {
    fn word(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_space: false,
        }
    }

    fn space() -> Self {
        Self {
            text: " ".to_string(),
            is_space: true,
        }
    }

    /// 显示文本：空格替换为不换行空格，避免被布局折叠
    pub fn display(&self) -> String {
        if self.is_space {
            NBSP.to_string()
        } else {
            self.text.clone()
        }
    }
}

/// 按粒度拆分文本
///
/// 单词模式按单个空格切分，相邻单词之间插入一个空格单元；连续空格产生的
/// 空单词会保留，保证拼接结果与原文一致。空文本返回空列表。
pub fn decompose(text: &str, mode: SplitMode) -> Vec<TextUnit> {
    if text.is_empty() {
        return Vec::new();
    }

    match mode {
        SplitMode::Chars => text
            .chars()
            .map(|c| {
                if c == ' ' {
                    TextUnit::space()
                } else {
                    TextUnit::word(c.encode_utf8(&mut [0; 4]))
                }
            })
            .collect(),
        SplitMode::Words => {
            let mut units = Vec::new();
            for (i, word) in text.split(' ').enumerate() {
                if i > 0 {
                    units.push(TextUnit::space());
                }
                units.push(TextUnit::word(word));
            }
            units
        }
    }
}

fn default_stagger() -> f32 {
    0.05
}

fn default_duration() -> f32 {
    0.6
}

fn default_easing() -> EasingFunction {
    EasingFunction::EaseOutQuart
}

fn default_from() -> Style {
    Style::hidden_at(Vec2::new(0.0, 40.0))
}

/// SplitText 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTextConfig {
    pub text: String,
    #[serde(default)]
    pub mode: SplitMode,
    /// 相邻单元的启动间隔（秒）
    #[serde(default = "default_stagger")]
    pub stagger: f32,
    /// 单个单元的时长（秒）
    #[serde(default = "default_duration")]
    pub duration: f32,
    #[serde(default = "default_easing")]
    pub easing: EasingFunction,
    #[serde(default = "default_from")]
    pub from: Style,
    #[serde(default)]
    pub to: Style,
    #[serde(default)]
    pub trigger: VisibilityOptions,
}

impl SplitTextConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SplitMode::default(),
            stagger: default_stagger(),
            duration: default_duration(),
            easing: default_easing(),
            from: default_from(),
            to: Style::identity(),
            trigger: VisibilityOptions::default(),
        }
    }

    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }
}

fn default_blur_stagger() -> f32 {
    0.1
}

fn default_blur_duration() -> f32 {
    0.8
}

/// 模糊入场预设的参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlurTextConfig {
    pub text: String,
    #[serde(default)]
    pub mode: SplitMode,
    #[serde(default = "default_blur_stagger")]
    pub stagger: f32,
    #[serde(default = "default_blur_duration")]
    pub duration: f32,
    #[serde(default)]
    pub trigger: VisibilityOptions,
}

impl BlurTextConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SplitMode::default(),
            stagger: default_blur_stagger(),
            duration: default_blur_duration(),
            trigger: VisibilityOptions::default(),
        }
    }

    /// 展开为通用拆分参数
    pub fn to_split_config(&self) -> SplitTextConfig {
        SplitTextConfig {
            text: self.text.clone(),
            mode: self.mode,
            stagger: self.stagger,
            duration: self.duration,
            easing: EasingFunction::EaseOutCubic,
            from: Style {
                blur: 20.0,
                ..Style::hidden_at(Vec2::new(0.0, 20.0))
            },
            to: Style::identity(),
            trigger: self.trigger,
        }
    }
}

/// 拆分文本入场效果
#[derive(Debug, Clone)]
pub struct SplitText {
    config: SplitTextConfig,
    units: Vec<TextUnit>,
    tweens: Vec<StyleTween>,
}

impl SplitText {
    pub fn new(config: SplitTextConfig) -> Self {
        let units = decompose(&config.text, config.mode);
        Self {
            config,
            units,
            tweens: Vec::new(),
        }
    }

    /// 模糊入场预设
    pub fn blur_in(text: impl Into<String>) -> Self {
        Self::new(BlurTextConfig::new(text).to_split_config())
    }

    pub fn config(&self) -> &SplitTextConfig {
        &self.config
    }

    pub fn units(&self) -> &[TextUnit] {
        &self.units
    }

    /// 从触发到最后一个单元结束的总时长
    pub fn total_span(&self) -> f32 {
        match self.units.len() {
            0 => 0.0,
            n => self.config.duration + (n - 1) as f32 * self.config.stagger,
        }
    }

    /// 当前帧（阅读顺序）
    pub fn frame(&self) -> Vec<UnitFrame> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, unit)| UnitFrame {
                text: unit.display(),
                style: self
                    .tweens
                    .get(i)
                    .map_or(self.config.from, StyleTween::current),
            })
            .collect()
    }
}

impl Effect for SplitText {
    fn kind(&self) -> &'static str {
        "split_text"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        if self.units.is_empty() {
            return;
        }
        ctx.emit(Patch::Units(self.frame()));
        ctx.observe(self.config.trigger);
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        match signal {
            Signal::Visible => {
                if !self.tweens.is_empty() || self.units.is_empty() {
                    return;
                }
                let config = &self.config;
                self.tweens = (0..self.units.len())
                    .map(|i| {
                        StyleTween::new(config.from, config.to, config.duration)
                            .with_easing(config.easing)
                            .with_delay(i as f32 * config.stagger)
                    })
                    .collect();
                ctx.request_frames();
            }
            Signal::Frame(dt) => {
                let mut running = false;
                for tween in &mut self.tweens {
                    running |= tween.update(dt);
                }
                ctx.emit(Patch::Units(self.frame()));
                if !running {
                    ctx.cancel_frames();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::stage::{Stage, Viewport};

    fn joined(units: &[TextUnit]) -> String {
        units.iter().map(|u| u.text.as_str()).collect()
    }

    #[test]
    fn test_decompose_words() {
        let units = decompose("Hi there", SplitMode::Words);
        let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi", " ", "there"]);
        assert!(units[1].is_space);
        assert_eq!(units[1].display(), "\u{00A0}");
    }

    #[test]
    fn test_decompose_round_trip() {
        for text in ["Hello, world", "a  b", " leading", "trailing ", "多字节 文本"] {
            assert_eq!(joined(&decompose(text, SplitMode::Chars)), text);
            assert_eq!(joined(&decompose(text, SplitMode::Words)), text);
        }
    }

    #[test]
    fn test_decompose_chars_space_display() {
        let units = decompose("a b", SplitMode::Chars);
        let shown: String = units.iter().map(TextUnit::display).collect();
        assert_eq!(shown, "a\u{00A0}b");
    }

    #[test]
    fn test_empty_text() {
        assert!(decompose("", SplitMode::Chars).is_empty());
        assert!(decompose("", SplitMode::Words).is_empty());

        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        stage.mount(
            SplitText::new(SplitTextConfig::new("")),
            Some(Rect::new(0.0, 0.0, 100.0, 20.0)),
        );
        stage.advance(1.0);
        assert!(stage.take_updates().is_empty());
        assert!(stage.resources().is_idle());
    }

    #[test]
    fn test_total_span() {
        let split = SplitText::new(SplitTextConfig::new("Hello"));
        assert!((split.total_span() - (0.6 + 4.0 * 0.05)).abs() < 1e-6);

        let blur = SplitText::blur_in("Hey");
        assert_eq!(blur.config().easing, EasingFunction::EaseOutCubic);
        assert_eq!(blur.config().from.blur, 20.0);
        assert!((blur.total_span() - (0.8 + 2.0 * 0.1)).abs() < 1e-6);
    }

    #[test]
    fn test_units_start_in_reading_order() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let id = stage.mount(
            SplitText::new(SplitTextConfig::new("abc")),
            Some(Rect::new(0.0, 0.0, 100.0, 20.0)),
        );

        // 第一个单元开始后、第二个单元开始前
        stage.advance(0.03);
        let units = stage.rendered(id).and_then(|p| p.as_units()).unwrap();
        assert!(units[0].style.opacity > 0.0);
        assert_eq!(units[1].style.opacity, 0.0);
        assert_eq!(units[2].style.opacity, 0.0);

        for _ in 0..60 {
            stage.advance(1.0 / 60.0);
        }
        let units = stage.rendered(id).and_then(|p| p.as_units()).unwrap();
        assert!(units.iter().all(|u| u.style == Style::identity()));
        assert!(stage.resources().is_idle());
    }
}
