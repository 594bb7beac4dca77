//! # Meter 效果
//!
//! 技能进度条 / 进度环：进入视口后从空填充到目标比例。
//!
//! 进度环以描边偏移表示：周长 `C = 2πr`，空环偏移为 `C`，
//! 比例为 `p` 时偏移为 `C × (1 - p)`。

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use super::Effect;
use crate::animation::{EasingFunction, Tween};
use crate::render::{MeterFrame, Patch};
use crate::stage::{EffectContext, Signal};
use crate::trigger::VisibilityOptions;

fn default_ring_radius() -> f32 {
    40.0
}

/// 进度形状
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MeterShape {
    /// 水平进度条
    #[default]
    Bar,
    /// 圆环
    Ring {
        #[serde(default = "default_ring_radius")]
        radius: f32,
    },
}

impl MeterShape {
    pub fn ring() -> Self {
        Self::Ring {
            radius: default_ring_radius(),
        }
    }

    /// 未指定时长时使用的默认值（秒）
    pub fn default_duration(&self) -> f32 {
        match self {
            Self::Bar => 0.8,
            Self::Ring { .. } => 1.0,
        }
    }
}

fn default_trigger() -> VisibilityOptions {
    VisibilityOptions::default().with_margin(-100.0)
}

/// Meter 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterConfig {
    /// 目标进度 (0 - 100)
    pub level: f32,
    #[serde(default)]
    pub shape: MeterShape,
    /// 时长（秒），缺省时按形状取默认值
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default)]
    pub delay: f32,
    #[serde(default = "default_trigger")]
    pub trigger: VisibilityOptions,
}

impl MeterConfig {
    pub fn new(level: f32, shape: MeterShape) -> Self {
        Self {
            level,
            shape,
            duration: None,
            delay: 0.0,
            trigger: default_trigger(),
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn duration(&self) -> f32 {
        self.duration
            .unwrap_or_else(|| self.shape.default_duration())
    }
}

/// 进度动画效果
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    config: MeterConfig,
    timeline: Option<Tween>,
}

impl ProgressMeter {
    pub fn new(config: MeterConfig) -> Self {
        Self {
            config,
            timeline: None,
        }
    }

    /// 目标填充比例
    pub fn target_fill(&self) -> f32 {
        (self.config.level / 100.0).clamp(0.0, 1.0)
    }

    /// 给定填充比例下的一帧
    pub fn frame_at(&self, fill: f32) -> MeterFrame {
        let stroke_offset = match self.config.shape {
            MeterShape::Bar => None,
            MeterShape::Ring { radius } => {
                let circumference = TAU * radius;
                Some(circumference * (1.0 - fill))
            }
        };
        MeterFrame {
            fill,
            stroke_offset,
        }
    }

    fn fill(&self) -> f32 {
        self.timeline.as_ref().map_or(0.0, Tween::value)
    }
}

impl Effect for ProgressMeter {
    fn kind(&self) -> &'static str {
        "meter"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.emit(Patch::Meter(self.frame_at(0.0)));
        ctx.observe(self.config.trigger);
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        match signal {
            Signal::Visible => {
                if self.timeline.is_some() {
                    return;
                }
                let timeline = Tween::new(0.0, self.target_fill(), self.config.duration())
                    .with_easing(EasingFunction::EaseOutCubic)
                    .with_delay(self.config.delay);
                self.timeline = Some(timeline);
                ctx.request_frames();
            }
            Signal::Frame(dt) => {
                let Some(timeline) = self.timeline.as_mut() else {
                    ctx.cancel_frames();
                    return;
                };
                let running = timeline.update(dt);
                ctx.emit(Patch::Meter(self.frame_at(self.fill())));
                if !running {
                    ctx.cancel_frames();
                }
            }
            _ => {}
        }
    }
}
