//! # Trigger 模块
//!
//! 可见性触发器：目标区域首次足够可见时发出且只发出一次通知。
//!
//! ## 状态机
//!
//! ```text
//! Armed ──(is_intersecting && ratio >= threshold)──► Fired
//! ```
//!
//! `Fired` 是终态。即使宿主重复投递相交事件（快速滚动、重叠回调），
//! `observe` 也只会在状态转换那一次返回 `true`。

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// 默认可见比例阈值
pub const DEFAULT_THRESHOLD: f32 = 0.1;

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

/// 观察参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityOptions {
    /// 可见比例阈值 (0.0 - 1.0)
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// 根区域外边距
    ///
    /// 负值收缩视口（元素需要更深入视口才触发），正值扩张视口（提前触发）。
    #[serde(default)]
    pub margin: f32,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            margin: 0.0,
        }
    }
}

impl VisibilityOptions {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// 计算目标相对于视口的相交信息
    pub fn measure(&self, target: &Rect, viewport: &Rect) -> IntersectionEntry {
        let root = viewport.inflate(self.margin);
        IntersectionEntry::between(target, &root)
    }
}

/// 一次相交观测
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// 可见面积 / 目标面积
    pub ratio: f32,
    /// 是否相交（边缘相接也算）
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    /// 计算 `target` 与 `root` 的相交信息
    ///
    /// 面积为 0 的目标只要与根区域相接，比例就视为 1.0。
    pub fn between(target: &Rect, root: &Rect) -> Self {
        let Some(hit) = target.intersection(root) else {
            return Self {
                ratio: 0.0,
                is_intersecting: false,
            };
        };

        let area = target.area();
        let ratio = if area > 0.0 {
            (hit.area() / area).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            ratio,
            is_intersecting: true,
        }
    }

    /// 由宿主直接给出的比例构造（比例大于 0 视为相交）
    pub fn from_ratio(ratio: f32) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            is_intersecting: ratio > 0.0,
        }
    }
}

/// 触发状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    /// 等待可见
    #[default]
    Armed,
    /// 已触发（终态）
    Fired,
}

/// 只触发一次的可见性触发器
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityTrigger {
    options: VisibilityOptions,
    state: TriggerState,
}

impl VisibilityTrigger {
    pub fn new(options: VisibilityOptions) -> Self {
        Self {
            options,
            state: TriggerState::Armed,
        }
    }

    pub fn options(&self) -> &VisibilityOptions {
        &self.options
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn has_fired(&self) -> bool {
        self.state == TriggerState::Fired
    }

    /// 投递一次观测
    ///
    /// # 返回
    /// 仅在 `Armed → Fired` 转换时返回 `true`
    pub fn observe(&mut self, entry: IntersectionEntry) -> bool {
        match self.state {
            TriggerState::Fired => false,
            TriggerState::Armed => {
                if entry.is_intersecting && entry.ratio >= self.options.threshold {
                    self.state = TriggerState::Fired;
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once() {
        let mut trigger = VisibilityTrigger::new(VisibilityOptions::default());
        let visible = IntersectionEntry::from_ratio(0.5);

        let fired = (0..10).filter(|_| trigger.observe(visible)).count();
        assert_eq!(fired, 1);
        assert!(trigger.has_fired());
    }

    #[test]
    fn test_does_not_refire_after_exit_and_reentry() {
        let mut trigger = VisibilityTrigger::new(VisibilityOptions::default());

        assert!(trigger.observe(IntersectionEntry::from_ratio(0.3)));
        assert!(!trigger.observe(IntersectionEntry::from_ratio(0.0)));
        assert!(!trigger.observe(IntersectionEntry::from_ratio(1.0)));
        assert_eq!(trigger.state(), TriggerState::Fired);
    }

    #[test]
    fn test_below_threshold_stays_armed() {
        let mut trigger =
            VisibilityTrigger::new(VisibilityOptions::default().with_threshold(0.5));
        assert!(!trigger.observe(IntersectionEntry::from_ratio(0.49)));
        assert_eq!(trigger.state(), TriggerState::Armed);
        assert!(trigger.observe(IntersectionEntry::from_ratio(0.5)));
    }

    #[test]
    fn test_measure_partial_visibility() {
        let viewport = Rect::new(0.0, 0.0, 1000.0, 800.0);
        // 下半部分在视口外
        let target = Rect::new(0.0, 700.0, 100.0, 200.0);
        let entry = VisibilityOptions::default().measure(&target, &viewport);
        assert!(entry.is_intersecting);
        assert!((entry.ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_negative_margin_delays_trigger() {
        let viewport = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let target = Rect::new(0.0, 750.0, 100.0, 100.0);

        let plain = VisibilityOptions::default().measure(&target, &viewport);
        assert!(plain.ratio >= DEFAULT_THRESHOLD);

        let shrunk = VisibilityOptions::default()
            .with_margin(-100.0)
            .measure(&target, &viewport);
        assert!(!shrunk.is_intersecting);
    }

    #[test]
    fn test_zero_area_target() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inside = IntersectionEntry::between(&Rect::new(10.0, 10.0, 0.0, 0.0), &root);
        assert_eq!(inside.ratio, 1.0);
        let outside = IntersectionEntry::between(&Rect::new(500.0, 10.0, 0.0, 0.0), &root);
        assert!(!outside.is_intersecting);
    }
}
