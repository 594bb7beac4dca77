//! # Effects 模块
//!
//! 视觉效果组件。每个效果都是独立的叶子：自己申请触发资源、
//! 自己管理动画生命周期，互相之间没有任何协调。
//!
//! | 效果            | 触发方式          | 长期资源                 |
//! |-----------------|-------------------|--------------------------|
//! | `Reveal`        | 可见性（一次）    | 动画期间的逐帧回调       |
//! | `SplitText`     | 可见性（一次）    | 动画期间的逐帧回调       |
//! | `Counter`       | 可见性（一次）    | 动画期间的逐帧回调       |
//! | `ProgressMeter` | 可见性（一次）    | 动画期间的逐帧回调       |
//! | `ScrambleText`  | 可见性（一次）    | 周期定时器               |
//! | `Magnet`        | 指针              | 指针监听                 |
//! | `Tilt`          | 指针              | 指针监听                 |
//! | `ParticleField` | 挂载即运行        | 逐帧回调 + 尺寸监听      |
//! | `GradientShift` | 挂载即运行        | 逐帧回调                 |

mod counter;
mod gradient;
mod magnet;
mod meter;
mod particles;
mod pose;
mod reveal;
mod scramble;
mod split_text;
mod tilt;

pub use counter::{Counter, CounterConfig};
pub use gradient::{GradientConfig, GradientShift};
pub use magnet::{Magnet, MagnetConfig};
pub use meter::{MeterConfig, MeterShape, ProgressMeter};
pub use particles::{Particle, ParticleConfig, ParticleField};
pub use reveal::{Direction, Reveal, RevealConfig};
pub use scramble::{DEFAULT_GLYPHS, ScrambleConfig, ScrambleText};
pub use split_text::{BlurTextConfig, SplitMode, SplitText, SplitTextConfig, TextUnit, decompose};
pub use tilt::{Tilt, TiltConfig};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stage::{EffectContext, Signal};

/// 效果组件接口
///
/// 效果通过实现此 trait 接入 `Stage`。所有外部交互都经由
/// `EffectContext`：申请/释放资源、读取目标区域与视口、输出补丁。
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Blink {
///     visible: bool,
/// }
///
/// impl Effect for Blink {
///     fn kind(&self) -> &'static str {
///         "blink"
///     }
///
///     fn mount(&mut self, ctx: &mut EffectContext<'_>) {
///         ctx.set_interval(0.5);
///     }
///
///     fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
///         if signal == Signal::Tick {
///             self.visible = !self.visible;
///             ctx.emit(Patch::Text(if self.visible { "_" } else { " " }.into()));
///         }
///     }
/// }
/// ```
pub trait Effect {
    /// 效果类型名（用于日志）
    fn kind(&self) -> &'static str;

    /// 挂载钩子：输出初始状态并申请资源
    fn mount(&mut self, ctx: &mut EffectContext<'_>);

    /// 处理信号
    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>);
}

/// 可由配置文件声明的效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSpec {
    Reveal(RevealConfig),
    SplitText(SplitTextConfig),
    BlurText(BlurTextConfig),
    Counter(CounterConfig),
    Magnet(MagnetConfig),
    Tilt(TiltConfig),
    Scramble(ScrambleConfig),
    Particles(ParticleConfig),
    Gradient(GradientConfig),
    Meter(MeterConfig),
}

impl EffectSpec {
    /// 类型名
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reveal(_) => "reveal",
            Self::SplitText(_) => "split_text",
            Self::BlurText(_) => "blur_text",
            Self::Counter(_) => "counter",
            Self::Magnet(_) => "magnet",
            Self::Tilt(_) => "tilt",
            Self::Scramble(_) => "scramble",
            Self::Particles(_) => "particles",
            Self::Gradient(_) => "gradient",
            Self::Meter(_) => "meter",
        }
    }

    /// 是否依赖目标区域（没有目标区域时效果不会被触发）
    pub fn needs_target(&self) -> bool {
        !matches!(self, Self::Particles(_) | Self::Gradient(_))
    }

    /// 构造效果实例
    pub fn build(&self) -> Box<dyn Effect> {
        match self {
            Self::Reveal(config) => Box::new(Reveal::new(config.clone())),
            Self::SplitText(config) => Box::new(SplitText::new(config.clone())),
            Self::BlurText(config) => Box::new(SplitText::new(config.to_split_config())),
            Self::Counter(config) => Box::new(Counter::new(config.clone())),
            Self::Magnet(config) => Box::new(Magnet::new(config.clone())),
            Self::Tilt(config) => Box::new(Tilt::new(config.clone())),
            Self::Scramble(config) => Box::new(ScrambleText::new(config.clone())),
            Self::Particles(config) => Box::new(ParticleField::new(config.clone())),
            Self::Gradient(config) => Box::new(GradientShift::new(config.clone())),
            Self::Meter(config) => Box::new(ProgressMeter::new(config.clone())),
        }
    }

    /// 验证参数，`name` 用于错误信息
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let check = Check::new(name);
        match self {
            Self::Reveal(c) => {
                check.non_negative("distance", c.distance)?;
                check.non_negative("duration", c.duration)?;
                check.non_negative("delay", c.delay)?;
                check.trigger(&c.trigger)
            }
            Self::SplitText(c) => {
                check.non_negative("stagger", c.stagger)?;
                check.non_negative("duration", c.duration)?;
                check.trigger(&c.trigger)
            }
            Self::BlurText(c) => {
                check.non_negative("stagger", c.stagger)?;
                check.non_negative("duration", c.duration)?;
                check.trigger(&c.trigger)
            }
            Self::Counter(c) => {
                check.finite("start", c.start)?;
                check.finite("end", c.end)?;
                check.non_negative("duration", c.duration)?;
                check.trigger(&c.trigger)
            }
            Self::Magnet(c) => {
                check.unit_range("strength", c.strength)?;
                check.non_negative("padding", c.padding)
            }
            Self::Tilt(c) => {
                check.non_negative("max_tilt", c.max_tilt)?;
                check.non_negative("scale", c.scale)?;
                check.non_negative("speed", c.speed)
            }
            Self::Scramble(c) => {
                check.non_negative("interval", c.interval)?;
                if c.alphabet.is_empty() {
                    return Err(check.fail("alphabet 不能为空"));
                }
                check.trigger(&c.trigger)
            }
            Self::Particles(c) => {
                check.non_negative("link_distance", c.link_distance)?;
                check.non_negative("max_speed", c.max_speed)?;
                check.unit_range("line_opacity", c.line_opacity)?;
                if !(c.density.is_finite() && c.density > 0.0) {
                    return Err(check.fail("density 必须大于 0"));
                }
                check.range("radius", c.radius)?;
                check.range("opacity", c.opacity)
            }
            Self::Gradient(c) => check.non_negative("step", c.step),
            Self::Meter(c) => {
                if !(0.0..=100.0).contains(&c.level) {
                    return Err(check.fail("level 必须在 0 - 100 之间"));
                }
                if let Some(duration) = c.duration {
                    check.non_negative("duration", duration)?;
                }
                check.non_negative("delay", c.delay)?;
                if let MeterShape::Ring { radius } = c.shape {
                    check.non_negative("radius", radius)?;
                }
                check.trigger(&c.trigger)
            }
        }
    }
}

/// 参数检查辅助
struct Check<'a> {
    name: &'a str,
}

impl<'a> Check<'a> {
    fn new(name: &'a str) -> Self {
        Self { name }
    }

    fn fail(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::Validation {
            effect: self.name.to_string(),
            message: message.into(),
        }
    }

    fn finite(&self, field: &str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(self.fail(format!("{} 必须是有限数值", field)))
        }
    }

    fn non_negative(&self, field: &str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(self.fail(format!("{} 必须是非负有限数值，实际为 {}", field, value)))
        }
    }

    fn unit_range(&self, field: &str, value: f32) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(self.fail(format!("{} 必须在 0.0 - 1.0 之间，实际为 {}", field, value)))
        }
    }

    fn range(&self, field: &str, [min, max]: [f32; 2]) -> Result<(), ConfigError> {
        self.non_negative(field, min)?;
        self.non_negative(field, max)?;
        if min > max {
            return Err(self.fail(format!("{} 的下限 {} 大于上限 {}", field, min, max)));
        }
        Ok(())
    }

    fn trigger(&self, options: &crate::trigger::VisibilityOptions) -> Result<(), ConfigError> {
        self.unit_range("threshold", options.threshold)?;
        if !options.margin.is_finite() {
            return Err(self.fail("margin 必须是有限数值"));
        }
        Ok(())
    }
}
