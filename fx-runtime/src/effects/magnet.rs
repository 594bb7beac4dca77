//! # Magnet 效果
//!
//! 指针靠近时元素被"吸"向指针，离开后弹性回位。

use serde::{Deserialize, Serialize};

use super::Effect;
use super::pose::Pose;
use crate::animation::{EasingFunction, Style};
use crate::render::Patch;
use crate::stage::{EffectContext, Signal};

/// 跟随指针的过渡时长（秒）
const FOLLOW_DURATION: f32 = 0.3;
/// 回位时长（秒）
const RETURN_DURATION: f32 = 0.5;

fn default_strength() -> f32 {
    0.5
}

fn default_padding() -> f32 {
    100.0
}

/// Magnet 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnetConfig {
    /// 吸附强度 (0.0 - 1.0)
    #[serde(default = "default_strength")]
    pub strength: f32,
    /// 感应区域向外扩张的距离
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default)]
    pub disabled: bool,
}

impl Default for MagnetConfig {
    fn default() -> Self {
        Self {
            strength: default_strength(),
            padding: default_padding(),
            disabled: false,
        }
    }
}

/// 磁吸效果
#[derive(Debug, Clone)]
pub struct Magnet {
    config: MagnetConfig,
    pose: Pose,
}

impl Magnet {
    pub fn new(mut config: MagnetConfig) -> Self {
        config.strength = config.strength.clamp(0.0, 1.0);
        Self {
            config,
            pose: Pose::default(),
        }
    }
}

impl Effect for Magnet {
    fn kind(&self) -> &'static str {
        "magnet"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        if self.config.disabled {
            return;
        }
        ctx.listen_pointer(self.config.padding);
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        match signal {
            Signal::PointerMove(point) => {
                let Some(rect) = ctx.rect() else {
                    return;
                };
                let target = (point - rect.center()).scale(self.config.strength);
                self.pose.retarget(
                    Style::with_offset(target),
                    FOLLOW_DURATION,
                    EasingFunction::EaseOutCubic,
                );
                ctx.request_frames();
            }
            Signal::PointerLeave => {
                self.pose
                    .retarget(Style::identity(), RETURN_DURATION, EasingFunction::EaseOutElastic);
                ctx.request_frames();
            }
            Signal::Frame(dt) => {
                let running = self.pose.step(dt);
                ctx.emit(Patch::Style(self.pose.current()));
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
    use crate::geometry::{Rect, Vec2};
    use crate::stage::{Stage, Viewport};

    fn settle(stage: &mut Stage) {
        for _ in 0..60 {
            stage.advance(1.0 / 60.0);
        }
    }

    #[test]
    fn test_follows_pointer_within_padding() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let id = stage.mount(
            Magnet::new(MagnetConfig::default()),
            Some(Rect::new(100.0, 100.0, 100.0, 100.0)),
        );
        assert_eq!(stage.resources().pointer_listeners, 1);

        // 中心 (150, 150)，指针在区域外但在 padding 内
        stage.pointer_move(Vec2::new(250.0, 150.0));
        settle(&mut stage);
        let style = stage.rendered(id).and_then(|p| p.as_style()).copied().unwrap();
        assert_eq!(style.offset, Vec2::new(50.0, 0.0));
        assert_eq!(stage.resources().frame_loops, 0);
    }

    #[test]
    fn test_returns_to_rest_on_leave() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let id = stage.mount(
            Magnet::new(MagnetConfig::default()),
            Some(Rect::new(100.0, 100.0, 100.0, 100.0)),
        );

        stage.pointer_move(Vec2::new(180.0, 120.0));
        settle(&mut stage);
        stage.pointer_move(Vec2::new(700.0, 500.0));
        settle(&mut stage);
        assert_eq!(
            stage.rendered(id).and_then(|p| p.as_style()),
            Some(&Style::identity())
        );
    }

    #[test]
    fn test_leave_overshoots_before_settling() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let id = stage.mount(
            Magnet::new(MagnetConfig::default()),
            Some(Rect::new(100.0, 100.0, 100.0, 100.0)),
        );

        // 中心 (150, 150)，吸附偏移 (15, -15)
        stage.pointer_move(Vec2::new(180.0, 120.0));
        settle(&mut stage);
        let held = stage.rendered(id).and_then(|p| p.as_style()).copied().unwrap();
        assert_eq!(held.offset, Vec2::new(15.0, -15.0));

        stage.pointer_move(Vec2::new(700.0, 500.0));
        let mut lowest_x = f32::MAX;
        for _ in 0..60 {
            stage.advance(1.0 / 60.0);
            if let Some(style) = stage.rendered(id).and_then(|p| p.as_style()) {
                lowest_x = lowest_x.min(style.offset.x);
            }
        }

        // 弹性回位会越过静止位置
        assert!(lowest_x < 0.0, "no overshoot, lowest x = {lowest_x}");
        assert_eq!(
            stage.rendered(id).and_then(|p| p.as_style()),
            Some(&Style::identity())
        );
        assert_eq!(stage.resources().frame_loops, 0);
    }

    #[test]
    fn test_disabled_ignores_pointer() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        stage.mount(
            Magnet::new(MagnetConfig {
                disabled: true,
                ..MagnetConfig::default()
            }),
            Some(Rect::new(100.0, 100.0, 100.0, 100.0)),
        );
        stage.pointer_move(Vec2::new(150.0, 150.0));
        settle(&mut stage);
        assert!(stage.take_updates().is_empty());
        assert!(stage.resources().is_idle());
    }
}
