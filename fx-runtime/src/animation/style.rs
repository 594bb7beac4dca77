//! # Style 模块
//!
//! 可动画的视觉状态，表示一个元素的位移、旋转、缩放、透明度和模糊。

use serde::{Deserialize, Serialize};

use super::{EasingFunction, Tween};
use crate::geometry::Vec2;

/// 视觉状态
///
/// 对应一个元素在某一帧的完整变换。`Style::identity()` 是元素的最终形态：
/// 无位移、无旋转、原始大小、完全不透明、无模糊。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// 位置偏移（相对于布局位置）
    pub offset: Vec2,
    /// 绕 X 轴旋转（度）
    pub rotate_x: f32,
    /// 绕 Y 轴旋转（度）
    pub rotate_y: f32,
    /// 均匀缩放
    pub scale: f32,
    /// 透明度 (0.0 - 1.0)
    pub opacity: f32,
    /// 模糊半径
    pub blur: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            offset: Vec2::zero(),
            rotate_x: 0.0,
            rotate_y: 0.0,
            scale: 1.0,
            opacity: 1.0,
            blur: 0.0,
        }
    }
}

impl Style {
    /// 最终形态
    pub fn identity() -> Self {
        Self::default()
    }

    /// 带偏移的透明状态（入场动画的起点）
    pub fn hidden_at(offset: Vec2) -> Self {
        Self {
            offset,
            opacity: 0.0,
            ..Self::default()
        }
    }

    /// 只有位移的状态
    pub fn with_offset(offset: Vec2) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// 线性插值到另一个状态
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            offset: self.offset.lerp(other.offset, t),
            rotate_x: mix(self.rotate_x, other.rotate_x),
            rotate_y: mix(self.rotate_y, other.rotate_y),
            scale: mix(self.scale, other.scale),
            opacity: mix(self.opacity, other.opacity),
            blur: mix(self.blur, other.blur),
        }
    }
}

/// 两个 `Style` 之间的时间轴
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTween {
    pub from: Style,
    pub to: Style,
    timeline: Tween,
}

impl StyleTween {
    pub fn new(from: Style, to: Style, duration: f32) -> Self {
        Self {
            from,
            to,
            timeline: Tween::unit(duration),
        }
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.timeline = self.timeline.with_easing(easing);
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.timeline = self.timeline.with_delay(delay);
        self
    }

    /// 推进时间轴，返回是否仍在进行中
    pub fn update(&mut self, dt: f32) -> bool {
        self.timeline.update(dt)
    }

    /// 当前状态；完成时精确等于 `to`
    pub fn current(&self) -> Style {
        if self.timeline.is_finished() {
            return self.to;
        }
        self.from.lerp(&self.to, self.timeline.value())
    }

    pub fn is_finished(&self) -> bool {
        self.timeline.is_finished()
    }

    /// 延迟 + 时长
    pub fn span(&self) -> f32 {
        self.timeline.span()
    }
}
