//! # Reveal 效果
//!
//! 元素进入视口时从偏移、透明的状态滑入到最终位置。

use serde::{Deserialize, Serialize};

use super::Effect;
use crate::animation::{EasingFunction, Style, StyleTween};
use crate::geometry::Vec2;
use crate::render::Patch;
use crate::stage::{EffectContext, Signal};
use crate::trigger::VisibilityOptions;

/// 滑入方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 从下方向上滑入
    #[default]
    Up,
    /// 从上方向下滑入
    Down,
    /// 从右侧向左滑入
    Left,
    /// 从左侧向右滑入
    Right,
}

impl Direction {
    /// 起始偏移
    pub fn start_offset(&self, distance: f32) -> Vec2 {
        match self {
            Self::Up => Vec2::new(0.0, distance),
            Self::Down => Vec2::new(0.0, -distance),
            Self::Left => Vec2::new(distance, 0.0),
            Self::Right => Vec2::new(-distance, 0.0),
        }
    }
}

fn default_distance() -> f32 {
    50.0
}

fn default_duration() -> f32 {
    0.8
}

/// Reveal 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_distance")]
    pub distance: f32,
    /// 时长（秒）
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// 触发后的延迟（秒）
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub trigger: VisibilityOptions,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            distance: default_distance(),
            duration: default_duration(),
            delay: 0.0,
            trigger: VisibilityOptions::default(),
        }
    }
}

impl RevealConfig {
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }
}

/// 滚动入场效果
#[derive(Debug, Clone)]
pub struct Reveal {
    config: RevealConfig,
    tween: Option<StyleTween>,
}

impl Reveal {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            tween: None,
        }
    }

    /// 入场前的状态
    pub fn hidden_style(&self) -> Style {
        Style::hidden_at(self.config.direction.start_offset(self.config.distance))
    }

    /// 是否已经开始过入场动画
    pub fn has_started(&self) -> bool {
        self.tween.is_some()
    }
}

impl Effect for Reveal {
    fn kind(&self) -> &'static str {
        "reveal"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.emit(Patch::Style(self.hidden_style()));
        ctx.observe(self.config.trigger);
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        match signal {
            Signal::Visible => {
                if self.has_started() {
                    return;
                }
                let tween = StyleTween::new(self.hidden_style(), Style::identity(), self.config.duration)
                    .with_easing(EasingFunction::EaseOutQuart)
                    .with_delay(self.config.delay);
                self.tween = Some(tween);
                ctx.request_frames();
            }
            Signal::Frame(dt) => {
                let Some(tween) = self.tween.as_mut() else {
                    ctx.cancel_frames();
                    return;
                };
                let running = tween.update(dt);
                ctx.emit(Patch::Style(tween.current()));
                if !running {
                    ctx.cancel_frames();
                }
            }
            _ => {}
        }
    }
}
