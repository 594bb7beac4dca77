//! # Counter 效果
//!
//! 进入视口时数字从起始值滚动到目标值。

use serde::{Deserialize, Serialize};

use super::Effect;
use crate::animation::{EasingFunction, Tween};
use crate::render::Patch;
use crate::stage::{EffectContext, Signal};
use crate::trigger::VisibilityOptions;

fn default_duration() -> f32 {
    2.0
}

/// Counter 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    #[serde(default)]
    pub start: f64,
    pub end: f64,
    /// 时长（秒）
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// 小数位数
    #[serde(default)]
    pub decimals: usize,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub trigger: VisibilityOptions,
}

impl CounterConfig {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            duration: default_duration(),
            decimals: 0,
            prefix: String::new(),
            suffix: String::new(),
            trigger: VisibilityOptions::default(),
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_affixes(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }
}

/// 定点小数位数上限
const MAX_DECIMALS: usize = 100;

/// 保留 `decimals` 位小数，恰好落在中点时远离零取整
///
/// `{:.*}` 对精确中点采用银行家舍入（`2.5` → `"2"`），这里改为远离零
/// （`2.5` → `"3"`，`0.125` → `"0.13"`）。只有二进制精确表示的中点才算中点：
/// `1.005` 实际略小于 1.005，结果仍是 `"1.00"`。
fn to_fixed(value: f64, decimals: usize) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    if value.is_finite() && value != 0.0 && is_exact_midpoint(value, decimals) {
        // 向远离零的方向挪一个 ulp，越过中点
        let nudged = f64::from_bits(value.to_bits() + 1);
        return format!("{:.*}", decimals, nudged);
    }
    format!("{:.*}", decimals, value)
}

/// `value` 的精确十进制展开是否恰好有 `decimals + 1` 位小数且末位为 5
fn is_exact_midpoint(value: f64, decimals: usize) -> bool {
    // 中点 k / 10^(d+1) 若能被 f64 精确表示，其分母只能是 2^(d+1) 的因子
    let scaled = value * 2f64.powi(decimals as i32 + 1);
    if !(scaled.is_finite() && scaled.fract() == 0.0) {
        return false;
    }
    // 此时 d+1 位的格式化结果没有舍入
    format!("{:.*}", decimals + 1, value).ends_with('5')
}

/// 数字滚动效果
#[derive(Debug, Clone)]
pub struct Counter {
    config: CounterConfig,
    timeline: Option<Tween>,
}

impl Counter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            timeline: None,
        }
    }

    /// 当前数值；完成时精确等于 `end`
    pub fn value(&self) -> f64 {
        let CounterConfig { start, end, .. } = self.config;
        match &self.timeline {
            None => start,
            Some(timeline) if timeline.is_finished() => end,
            Some(timeline) => start + (end - start) * f64::from(timeline.value()),
        }
    }

    /// 格式化数值：前缀 + 定点小数 + 后缀
    pub fn format(&self, value: f64) -> String {
        format!(
            "{}{}{}",
            self.config.prefix,
            to_fixed(value, self.config.decimals),
            self.config.suffix
        )
    }

    fn render(&self) -> Patch {
        Patch::Text(self.format(self.value()))
    }
}

impl Effect for Counter {
    fn kind(&self) -> &'static str {
        "counter"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.emit(self.render());
        ctx.observe(self.config.trigger);
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        match signal {
            Signal::Visible => {
                if self.timeline.is_some() {
                    return;
                }
                self.timeline =
                    Some(Tween::unit(self.config.duration).with_easing(EasingFunction::EaseOutCubic));
                ctx.request_frames();
            }
            Signal::Frame(dt) => {
                let Some(timeline) = self.timeline.as_mut() else {
                    ctx.cancel_frames();
                    return;
                };
                let running = timeline.update(dt);
                ctx.emit(self.render());
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
    use crate::geometry::Rect;
    use crate::stage::{Stage, Viewport};

    #[test]
    fn test_format() {
        let counter = Counter::new(CounterConfig::new(0.0, 10.0).with_affixes("$", "k"));
        assert_eq!(counter.format(4.0), "$4k");

        let counter = Counter::new(CounterConfig::new(0.0, 10.0).with_decimals(2));
        assert_eq!(counter.format(3.14159), "3.14");
    }

    #[test]
    fn test_format_rounds_midpoints_away_from_zero() {
        let whole = Counter::new(CounterConfig::new(0.0, 10.0));
        assert_eq!(whole.format(2.5), "3");
        assert_eq!(whole.format(0.5), "1");
        assert_eq!(whole.format(-2.5), "-3");
        assert_eq!(whole.format(2.4), "2");

        let cents = Counter::new(CounterConfig::new(0.0, 10.0).with_decimals(2));
        assert_eq!(cents.format(0.125), "0.13");
        assert_eq!(cents.format(0.375), "0.38");
        // 1.005 的二进制值略小于中点
        assert_eq!(cents.format(1.005), "1.00");
        assert_eq!(cents.format(7.0), "7.00");
    }

    #[test]
    fn test_final_value_on_midpoint() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let id = stage.mount(
            Counter::new(CounterConfig::new(0.0, 2.5).with_duration(0.5)),
            Some(Rect::new(0.0, 0.0, 100.0, 40.0)),
        );
        stage.advance(1.0);
        assert_eq!(stage.rendered(id).and_then(|p| p.as_text()), Some("3"));
        assert!(stage.resources().is_idle());
    }

    #[test]
    fn test_renders_start_until_visible() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let id = stage.mount(
            Counter::new(CounterConfig::new(5.0, 50.0).with_affixes("", "+")),
            Some(Rect::new(0.0, 2000.0, 100.0, 40.0)),
        );
        stage.advance(3.0);
        assert_eq!(stage.rendered(id).and_then(|p| p.as_text()), Some("5+"));
    }

    #[test]
    fn test_final_value_exact_with_decimals() {
        let mut stage = Stage::with_seed(Viewport::new(800.0, 600.0), 1);
        let id = stage.mount(
            Counter::new(
                CounterConfig::new(0.0, 4.9)
                    .with_decimals(1)
                    .with_duration(0.5),
            ),
            Some(Rect::new(0.0, 0.0, 100.0, 40.0)),
        );
        for _ in 0..40 {
            stage.advance(1.0 / 60.0);
        }
        assert_eq!(stage.rendered(id).and_then(|p| p.as_text()), Some("4.9"));
        assert!(stage.resources().is_idle());
    }
}
