//! # Gradient 效果
//!
//! 渐变文字背景持续平移。挂载即运行，直到卸载。

use serde::{Deserialize, Serialize};

use super::Effect;
use crate::render::{GradientFrame, Patch};
use crate::stage::{EffectContext, Signal};

/// 背景位置达到此值后归零
const WRAP_AT: f32 = 360.0;

fn default_colors() -> Vec<String> {
    ["#14b8a6", "#06b6d4", "#3b82f6", "#14b8a6"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_step() -> f32 {
    0.5
}

/// Gradient 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,
    /// 每帧平移量（百分比）
    #[serde(default = "default_step")]
    pub step: f32,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            step: default_step(),
        }
    }
}

/// 渐变平移效果
#[derive(Debug, Clone)]
pub struct GradientShift {
    config: GradientConfig,
    /// 自上次归零以来的帧数（避免累加误差）
    frames: u32,
}

impl GradientShift {
    pub fn new(config: GradientConfig) -> Self {
        Self { config, frames: 0 }
    }

    /// 当前背景位置
    pub fn position(&self) -> f32 {
        self.frames as f32 * self.config.step
    }

    fn advance(&mut self) {
        self.frames += 1;
        if self.position() >= WRAP_AT {
            self.frames = 0;
        }
    }

    fn render(&self) -> Patch {
        Patch::Gradient(GradientFrame {
            position: self.position(),
            colors: self.config.colors.clone(),
        })
    }
}

impl Effect for GradientShift {
    fn kind(&self) -> &'static str {
        "gradient"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.emit(self.render());
        if self.config.step > 0.0 {
            ctx.request_frames();
        }
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        if let Signal::Frame(_) = signal {
            self.advance();
            ctx.emit(self.render());
        }
    }
}
