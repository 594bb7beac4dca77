//! 跟随指针的姿态：任何时刻都可以从当前状态重新指向新的目标。

use crate::animation::{EasingFunction, Style, StyleTween};

#[derive(Debug, Clone, Default)]
pub(super) struct Pose {
    tween: Option<StyleTween>,
    settled: Style,
}

impl Pose {
    /// 当前状态
    pub fn current(&self) -> Style {
        self.tween
            .as_ref()
            .map_or(self.settled, StyleTween::current)
    }

    /// 从当前状态开始过渡到 `target`（打断进行中的过渡）
    pub fn retarget(&mut self, target: Style, duration: f32, easing: EasingFunction) {
        let from = self.current();
        self.tween = Some(StyleTween::new(from, target, duration).with_easing(easing));
    }

    /// 推进过渡，返回是否仍在进行中
    pub fn step(&mut self, dt: f32) -> bool {
        let Some(tween) = self.tween.as_mut() else {
            return false;
        };
        if tween.update(dt) {
            return true;
        }
        self.settled = tween.current();
        self.tween = None;
        false
    }
}
