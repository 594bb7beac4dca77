//! # Tilt 效果
//!
//! 卡片随指针位置做 3D 倾斜。

use serde::{Deserialize, Serialize};

use super::Effect;
use super::pose::Pose;
use crate::animation::{EasingFunction, Style};
use crate::geometry::{Rect, Vec2};
use crate::render::Patch;
use crate::stage::{EffectContext, Signal};

fn default_max_tilt() -> f32 {
    10.0
}

fn default_scale() -> f32 {
    1.02
}

fn default_speed() -> f32 {
    400.0
}

/// Tilt 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiltConfig {
    /// 最大倾斜角（度）
    #[serde(default = "default_max_tilt")]
    pub max_tilt: f32,
    /// 悬停时的缩放
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// 过渡时长（毫秒）
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            max_tilt: default_max_tilt(),
            scale: default_scale(),
            speed: default_speed(),
        }
    }
}

impl TiltConfig {
    /// 指针位于 `point` 时的目标姿态
    pub fn pose_at(&self, rect: &Rect, point: Vec2) -> Style {
        let center = rect.center();
        let normalize = |delta: f32, extent: f32| {
            if extent > 0.0 {
                (delta / (extent / 2.0)).clamp(-1.0, 1.0)
            } else {
                0.0
            }
        };
        let px = normalize(point.x - center.x, rect.width);
        let py = normalize(point.y - center.y, rect.height);

        Style {
            rotate_x: -py * self.max_tilt,
            rotate_y: px * self.max_tilt,
            scale: self.scale,
            ..Style::identity()
        }
    }

    fn duration(&self) -> f32 {
        self.speed / 1000.0
    }
}

/// 倾斜卡片效果
#[derive(Debug, Clone)]
pub struct Tilt {
    config: TiltConfig,
    pose: Pose,
}

impl Tilt {
    pub fn new(config: TiltConfig) -> Self {
        Self {
            config,
            pose: Pose::default(),
        }
    }
}

impl Effect for Tilt {
    fn kind(&self) -> &'static str {
        "tilt"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.listen_pointer(0.0);
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        let duration = self.config.duration();
        match signal {
            Signal::PointerMove(point) => {
                let Some(rect) = ctx.rect() else {
                    return;
                };
                let target = self.config.pose_at(&rect, point);
                self.pose.retarget(target, duration, EasingFunction::EaseOutCubic);
                ctx.request_frames();
            }
            Signal::PointerLeave => {
                self.pose
                    .retarget(Style::identity(), duration, EasingFunction::EaseOutCubic);
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
    use crate::stage::{Stage, Viewport};

    #[test]
    fn test_pose_at_corner() {
        let config = TiltConfig::default();
        let rect = Rect::new(0.0, 0.0, 200.0, 100.0);

        // 右下角：向右、向下各偏移到边缘
        let pose = config.pose_at(&rect, Vec2::new(200.0, 100.0));
        assert_eq!(pose.rotate_y, 10.0);
        assert_eq!(pose.rotate_x, -10.0);
        assert_eq!(pose.scale, 1.02);

        let center = config.pose_at(&rect, rect.center());
        assert_eq!(center.rotate_x, 0.0);
        assert_eq!(center.rotate_y, 0.0);
    }

    #[test]
    fn test_pose_clamped_and_zero_size() {
        let config = TiltConfig::default();
        let pose = config.pose_at(&Rect::new(0.0, 0.0, 100.0, 100.0), Vec2::new(-500.0, 50.0));
        assert_eq!(pose.rotate_y, -10.0);

        let flat = config.pose_at(&Rect::new(0.0, 0.0, 0.0, 0.0), Vec2::new(10.0, 10.0));
        assert_eq!(flat.rotate_x, 0.0);
        assert_eq!(flat.rotate_y, 0.0);
    }

    #[test]
    fn test_tilts_and_resets() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        let id = stage.mount(Tilt::new(TiltConfig::default()), Some(rect));

        stage.pointer_move(Vec2::new(300.0, 200.0));
        for _ in 0..30 {
            stage.advance(1.0 / 60.0);
        }
        let style = stage.rendered(id).and_then(|p| p.as_style()).copied().unwrap();
        assert_eq!(style.rotate_y, 10.0);
        assert_eq!(style.scale, 1.02);

        stage.pointer_exit();
        for _ in 0..30 {
            stage.advance(1.0 / 60.0);
        }
        assert_eq!(
            stage.rendered(id).and_then(|p| p.as_style()),
            Some(&Style::identity())
        );
        assert_eq!(stage.resources().pointer_listeners, 1);
        assert_eq!(stage.resources().frame_loops, 0);
    }
}
