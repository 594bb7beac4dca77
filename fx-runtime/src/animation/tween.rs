//! # Tween 模块
//!
//! 单个 f32 值的时间轴。
//!
//! 核心设计：时间轴只关注值随时间的变化，不假设对象类型。
//! 完成时 `value()` 直接返回 `to`，末帧不会出现浮点漂移。

use super::EasingFunction;

/// 时间轴状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（延迟中）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已完成
    Completed,
}

impl TweenState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Playing)
    }
}

/// 时间轴
///
/// 管理单个 f32 值从 `from` 到 `to` 在 `duration` 秒内的变化。
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    /// 起始值
    pub from: f32,
    /// 目标值
    pub to: f32,
    /// 时长（秒）
    pub duration: f32,
    /// 缓动函数
    pub easing: EasingFunction,
    /// 延迟启动（秒）
    pub delay: f32,
    /// 当前状态
    pub state: TweenState,
    /// 当前进度（已应用缓动）
    pub progress: f32,
    /// 已经过的时间
    elapsed: f32,
}

impl Tween {
    /// 创建新的时间轴
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            easing: EasingFunction::default(),
            delay: 0.0,
            state: TweenState::Pending,
            progress: 0.0,
            elapsed: 0.0,
        }
    }

    /// 0 → 1 的归一化时间轴
    pub fn unit(duration: f32) -> Self {
        Self::new(0.0, 1.0, duration)
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// 推进时间轴
    ///
    /// # 返回
    /// - `true`: 仍在进行中
    /// - `false`: 已结束
    pub fn update(&mut self, dt: f32) -> bool {
        match self.state {
            TweenState::Pending => {
                self.elapsed += dt;
                if self.elapsed >= self.delay {
                    self.state = TweenState::Playing;
                    self.elapsed -= self.delay;
                    self.update_playing()
                } else {
                    true
                }
            }
            TweenState::Playing => {
                self.elapsed += dt;
                self.update_playing()
            }
            TweenState::Completed => false,
        }
    }

    fn update_playing(&mut self) -> bool {
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            self.progress = 1.0;
            self.state = TweenState::Completed;
            return false;
        }

        self.progress = self.easing.apply(self.elapsed / self.duration);
        true
    }

    /// 当前值
    pub fn value(&self) -> f32 {
        if self.state == TweenState::Completed {
            return self.to;
        }
        self.from + (self.to - self.from) * self.progress
    }

    /// 总时长（延迟 + 播放）
    pub fn span(&self) -> f32 {
        self.delay + self.duration
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state == TweenState::Completed
    }

    /// 是否为活跃状态
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tween() -> Tween {
        Tween::new(0.0, 1.0, 1.0).with_easing(EasingFunction::Linear)
    }

    #[test]
    fn test_tween_creation() {
        let tween = create_test_tween();
        assert_eq!(tween.state, TweenState::Pending);
        assert_eq!(tween.progress, 0.0);
        assert_eq!(tween.value(), 0.0);
    }

    #[test]
    fn test_tween_update() {
        let mut tween = create_test_tween();

        assert!(tween.update(0.1));
        assert_eq!(tween.state, TweenState::Playing);

        assert!(tween.update(0.4));
        let value = tween.value();
        assert!(value > 0.0 && value < 1.0);

        assert!(!tween.update(0.6));
        assert_eq!(tween.state, TweenState::Completed);
        assert_eq!(tween.value(), 1.0);

        // 完成后继续推进不再变化
        assert!(!tween.update(1.0));
        assert_eq!(tween.value(), 1.0);
    }

    #[test]
    fn test_tween_with_delay() {
        let mut tween = create_test_tween().with_delay(0.5);

        assert!(tween.update(0.3));
        assert_eq!(tween.state, TweenState::Pending);
        assert_eq!(tween.value(), 0.0);

        assert!(tween.update(0.3));
        assert_eq!(tween.state, TweenState::Playing);
        assert!((tween.value() - 0.1).abs() < 1e-5);
        assert_eq!(tween.span(), 1.5);
    }

    #[test]
    fn test_zero_duration_completes_on_first_update() {
        let mut tween = Tween::new(3.0, 7.0, 0.0);
        assert_eq!(tween.value(), 3.0);
        assert!(!tween.update(0.0));
        assert_eq!(tween.value(), 7.0);
    }

    #[test]
    fn test_final_value_is_exact() {
        // 完成时返回 to 本身，而不是 from + (to - from) * 1.0
        let mut tween = Tween::new(0.1, 0.7, 0.3);
        for _ in 0..10 {
            tween.update(0.05);
        }
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 0.7);
    }
}
