//! # Particles 效果
//!
//! 铺满视口的环境粒子：每帧匀速漂移，越过边界从对侧绕回，
//! 距离足够近的粒子之间连线，线条透明度随距离衰减。
//!
//! 运动按帧计算（每帧位移 = 速度），与帧间隔无关。

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Effect;
use crate::geometry::Vec2;
use crate::render::{CanvasFrame, Circle, Line, Patch};
use crate::stage::{EffectContext, Signal};

fn default_link_distance() -> f32 {
    120.0
}

fn default_density() -> f32 {
    15000.0
}

fn default_radius() -> [f32; 2] {
    [1.0, 3.0]
}

fn default_opacity() -> [f32; 2] {
    [0.2, 0.7]
}

fn default_max_speed() -> f32 {
    0.5
}

fn default_line_opacity() -> f32 {
    0.2
}

/// Particles 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    /// 连线的最大距离
    #[serde(default = "default_link_distance")]
    pub link_distance: f32,
    /// 每个粒子占据的面积（粒子数 = 面积 / density）
    #[serde(default = "default_density")]
    pub density: f32,
    /// 半径范围 [min, max]
    #[serde(default = "default_radius")]
    pub radius: [f32; 2],
    /// 透明度范围 [min, max]
    #[serde(default = "default_opacity")]
    pub opacity: [f32; 2],
    /// 每轴每帧的最大速度
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// 距离为 0 时的连线透明度
    #[serde(default = "default_line_opacity")]
    pub line_opacity: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            link_distance: default_link_distance(),
            density: default_density(),
            radius: default_radius(),
            opacity: default_opacity(),
            max_speed: default_max_speed(),
            line_opacity: default_line_opacity(),
        }
    }
}

impl ParticleConfig {
    /// 给定画布尺寸下的粒子数
    pub fn population(&self, width: f32, height: f32) -> usize {
        if width <= 0.0 || height <= 0.0 || self.density <= 0.0 {
            return 0;
        }
        (f64::from(width) * f64::from(height) / f64::from(self.density)).floor() as usize
    }
}

/// 单个粒子
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub opacity: f32,
}

/// 绕回到 `[0, extent)`
fn wrap(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid 在极小负数上可能返回 extent 本身
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// 上下限颠倒时交换
fn ordered([min, max]: [f32; 2]) -> [f32; 2] {
    if min <= max { [min, max] } else { [max, min] }
}

/// 环境粒子效果
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: ParticleConfig,
    width: f32,
    height: f32,
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new(mut config: ParticleConfig) -> Self {
        config.radius = ordered(config.radius);
        config.opacity = ordered(config.opacity);
        Self {
            config,
            width: 0.0,
            height: 0.0,
            particles: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// 按画布尺寸重新生成全部粒子
    pub fn populate(&mut self, width: f32, height: f32, rng: &mut impl Rng) {
        self.width = width;
        self.height = height;

        let count = self.config.population(width, height);
        let [min_radius, max_radius] = self.config.radius;
        let [min_opacity, max_opacity] = self.config.opacity;
        let speed = self.config.max_speed.abs();

        self.particles = (0..count)
            .map(|_| Particle {
                position: Vec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)),
                velocity: Vec2::new(rng.gen_range(-speed..=speed), rng.gen_range(-speed..=speed)),
                radius: rng.gen_range(min_radius..=max_radius),
                opacity: rng.gen_range(min_opacity..=max_opacity),
            })
            .collect();
    }

    /// 推进一帧
    pub fn step(&mut self) {
        for particle in &mut self.particles {
            let next = particle.position + particle.velocity;
            particle.position = Vec2::new(wrap(next.x, self.width), wrap(next.y, self.height));
        }
    }

    /// 当前画面
    pub fn frame(&self) -> CanvasFrame {
        let circles = self
            .particles
            .iter()
            .map(|p| Circle {
                center: p.position,
                radius: p.radius,
                opacity: p.opacity,
            })
            .collect();

        let link = self.config.link_distance;
        let mut lines = Vec::new();
        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = a.position.distance(b.position);
                if distance < link {
                    lines.push(Line {
                        from: a.position,
                        to: b.position,
                        opacity: self.config.line_opacity * (1.0 - distance / link),
                    });
                }
            }
        }

        CanvasFrame {
            width: self.width,
            height: self.height,
            circles,
            lines,
        }
    }
}

impl Effect for ParticleField {
    fn kind(&self) -> &'static str {
        "particles"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        let viewport = ctx.viewport();
        self.populate(viewport.width, viewport.height, ctx.rng());
        debug!(id = %ctx.id(), count = self.particles.len(), "生成粒子");

        ctx.listen_resize();
        ctx.request_frames();
        ctx.emit(Patch::Canvas(self.frame()));
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        match signal {
            Signal::Resize { width, height } => {
                self.populate(width, height, ctx.rng());
                debug!(id = %ctx.id(), count = self.particles.len(), "画布尺寸变化，重新生成粒子");
                ctx.emit(Patch::Canvas(self.frame()));
            }
            Signal::Frame(_) => {
                self.step();
                ctx.emit(Patch::Canvas(self.frame()));
            }
            _ => {}
        }
    }
}
