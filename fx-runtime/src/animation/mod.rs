//! # Animation 模块
//!
//! 效果组件共用的时间轴与插值工具。
//!
//! ## 核心设计理念
//!
//! 动画只负责 **时间轴管理**：
//! - 知道某个值从 A 到 B 需要在 duration 内变化（可带延迟）
//! - 缓动函数是 `[0, 1] → [0, 1]` 的纯函数，可独立测试
//! - **不假设对象类型**，效果自己决定如何使用这些值
//!
//! ## 核心概念
//!
//! - `Tween`: 单个 f32 值的时间轴
//! - `Style`: 可动画的视觉状态（位移、旋转、缩放、透明度、模糊）
//! - `StyleTween`: 两个 `Style` 之间的时间轴
//! - `EasingFunction`: 缓动函数

mod easing;
mod style;
mod tween;

pub use easing::EasingFunction;
pub use style::{Style, StyleTween};
pub use tween::{Tween, TweenState};
