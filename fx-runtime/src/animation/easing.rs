//! # Easing 模块
//!
//! 缓动函数库，用于动画的时间插值。
//!
//! 除了枚举名本身，还接受 GSAP / framer 风格的名字（`power2.out`、
//! `elastic.out`、`easeOut` 等），方便直接沿用前端配置。

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 二次缓入（power1.in）
    EaseInQuad,
    /// 二次缓出（power1.out）
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 三次缓入（power2.in）
    EaseInCubic,
    /// 三次缓出（power2.out）
    EaseOutCubic,
    /// 三次缓入缓出
    #[default]
    EaseInOutCubic,
    /// 四次缓入（power3.in）
    EaseInQuart,
    /// 四次缓出（power3.out）
    EaseOutQuart,
    /// 四次缓入缓出
    EaseInOutQuart,
    /// 正弦缓入缓出
    EaseInOutSine,
    /// 弹性缓出（elastic.out(1, 0.3)）
    EaseOutElastic,
    /// 弹跳缓出
    EaseOutBounce,
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值；端点严格为 0.0 / 1.0（弹性曲线中段可能超出 1.0）
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseInQuart => t.powi(4),
            Self::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Self::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Self::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::EaseOutElastic => ease_out_elastic(t),
            Self::EaseOutBounce => ease_out_bounce(t),
        }
    }

    /// 规范名称（用于序列化）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseInQuad => "ease_in_quad",
            Self::EaseOutQuad => "ease_out_quad",
            Self::EaseInOutQuad => "ease_in_out_quad",
            Self::EaseInCubic => "ease_in_cubic",
            Self::EaseOutCubic => "ease_out_cubic",
            Self::EaseInOutCubic => "ease_in_out_cubic",
            Self::EaseInQuart => "ease_in_quart",
            Self::EaseOutQuart => "ease_out_quart",
            Self::EaseInOutQuart => "ease_in_out_quart",
            Self::EaseInOutSine => "ease_in_out_sine",
            Self::EaseOutElastic => "ease_out_elastic",
            Self::EaseOutBounce => "ease_out_bounce",
        }
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EasingFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let easing = match s.trim() {
            "linear" | "none" => Self::Linear,
            "ease_in_quad" | "power1.in" => Self::EaseInQuad,
            "ease_out_quad" | "power1.out" => Self::EaseOutQuad,
            "ease_in_out_quad" | "power1.inOut" => Self::EaseInOutQuad,
            "ease_in_cubic" | "power2.in" | "easeIn" | "ease-in" => Self::EaseInCubic,
            "ease_out_cubic" | "power2.out" | "easeOut" | "ease-out" => Self::EaseOutCubic,
            "ease_in_out_cubic" | "power2.inOut" | "easeInOut" | "ease-in-out" => {
                Self::EaseInOutCubic
            }
            "ease_in_quart" | "power3.in" => Self::EaseInQuart,
            "ease_out_quart" | "power3.out" => Self::EaseOutQuart,
            "ease_in_out_quart" | "power3.inOut" => Self::EaseInOutQuart,
            "ease_in_out_sine" | "sine.inOut" => Self::EaseInOutSine,
            "ease_out_elastic" | "elastic.out" | "elastic.out(1, 0.3)" => Self::EaseOutElastic,
            "ease_out_bounce" | "bounce.out" => Self::EaseOutBounce,
            other => return Err(format!("未知的缓动函数 '{}'", other)),
        };
        Ok(easing)
    }
}

impl TryFrom<String> for EasingFunction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EasingFunction> for String {
    fn from(value: EasingFunction) -> Self {
        value.name().to_string()
    }
}

/// 弹性缓出（振幅 1，周期 0.3）
fn ease_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

/// 弹跳缓出
fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EasingFunction; 13] = [
        EasingFunction::Linear,
        EasingFunction::EaseInQuad,
        EasingFunction::EaseOutQuad,
        EasingFunction::EaseInOutQuad,
        EasingFunction::EaseInCubic,
        EasingFunction::EaseOutCubic,
        EasingFunction::EaseInOutCubic,
        EasingFunction::EaseInQuart,
        EasingFunction::EaseOutQuart,
        EasingFunction::EaseInOutQuart,
        EasingFunction::EaseInOutSine,
        EasingFunction::EaseOutElastic,
        EasingFunction::EaseOutBounce,
    ];

    #[test]
    fn test_linear() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(0.5), 0.5);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn test_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing} at 1");
        }
    }

    #[test]
    fn test_clamp() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_decelerating_curves_are_monotonic() {
        for easing in [
            EasingFunction::EaseOutQuad,
            EasingFunction::EaseOutCubic,
            EasingFunction::EaseOutQuart,
        ] {
            let mut last = 0.0;
            for step in 0..=100 {
                let value = easing.apply(step as f32 / 100.0);
                assert!(value >= last, "{easing} decreased at step {step}");
                last = value;
            }
            // 减速曲线在前半段已走完大半
            assert!(easing.apply(0.5) > 0.5);
        }
    }

    #[test]
    fn test_elastic_overshoots() {
        let easing = EasingFunction::EaseOutElastic;
        let peak = (1..100)
            .map(|step| easing.apply(step as f32 / 100.0))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_parse_gsap_names() {
        assert_eq!(
            "power2.out".parse::<EasingFunction>(),
            Ok(EasingFunction::EaseOutCubic)
        );
        assert_eq!(
            "power3.out".parse::<EasingFunction>(),
            Ok(EasingFunction::EaseOutQuart)
        );
        assert_eq!(
            "elastic.out(1, 0.3)".parse::<EasingFunction>(),
            Ok(EasingFunction::EaseOutElastic)
        );
        assert!("wobble".parse::<EasingFunction>().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&EasingFunction::EaseOutQuart).unwrap();
        assert_eq!(json, "\"ease_out_quart\"");

        let parsed: EasingFunction = serde_json::from_str("\"power2.out\"").unwrap();
        assert_eq!(parsed, EasingFunction::EaseOutCubic);
    }
}
